use tracing::debug;

use crate::{
    error::{FieldErrors, INVALID_INTEGER},
    models::{Movie, MovieQuery, present},
    store,
};

pub const SEARCH_FIELDS: [&str; 5] = ["Title", "Director", "Writer", "Actors", "Production"];

/// Splits `-Field` into (`Field`, descending).
pub fn parse_order(order: &str) -> (&str, bool) {
    match order.strip_prefix('-') {
        Some(field) => (field, true),
        None => (order, false),
    }
}

/// Applies order, search and year, in that sequence, then paginates.
pub fn list_movies(movies: Vec<Movie>, params: &MovieQuery, page_size: usize) -> Vec<Movie> {
    let mut movies = movies;

    if let Some(order) = present(&params.order) {
        let (field, descending) = parse_order(order);
        movies = store::order_by_field(movies, field, descending);
    }

    if let Some(search) = present(&params.search) {
        movies = store::filter_by_substring(movies, &SEARCH_FIELDS, search);
    }

    if let Some(year) = present(&params.year) {
        movies = store::filter_by_year(movies, year);
    }

    debug!(matched = movies.len(), "movie listing filtered");
    paginate(movies, params.page.as_deref(), page_size)
}

/// Parses the optional `movie` filter of the comment listing.
pub fn parse_movie_filter(raw: &Option<String>) -> Result<Option<i32>, FieldErrors> {
    match present(raw) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FieldErrors::from([("movie", INVALID_INTEGER)])),
    }
}

/// One 1-indexed page of `items`. A missing page means the first one; a page
/// that is not a positive integer or lies past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: Option<&str>, page_size: usize) -> Vec<T> {
    let page_size = page_size.max(1);
    let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(page) if page >= 1 => page,
            _ => {
                debug!(page = %raw, "invalid page requested");
                return Vec::new();
            },
        },
    };

    let Some(start) = (page - 1).checked_mul(page_size) else {
        return Vec::new();
    };
    items.into_iter().skip(start).take(page_size).collect()
}
