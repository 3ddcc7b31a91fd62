use std::cmp::Ordering;

use jiff::Timestamp;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait, sea_query::JoinType,
};
use tracing::debug;

use crate::{
    entities::{comment, movie},
    models::{Comment, ExternalData, Movie},
};

/// Persistent collection of movies and their comments.
///
/// Reads always come back in primary-key order.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn movies(&self) -> Result<Vec<Movie>, DbErr> {
        let rows = movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    /// First movie, in primary-key order, whose `Title` equals `title` ignoring case.
    pub async fn movie_by_title(&self, title: &str) -> Result<Option<Movie>, DbErr> {
        let movies = self.movies().await?;
        Ok(movies.into_iter().find(|m| m.external_data.field_equals("Title", title)))
    }

    pub async fn create_movie(&self, external_data: ExternalData) -> Result<Movie, DbErr> {
        let model = movie::ActiveModel {
            id: Default::default(),
            external_data: Set(external_data.into_json()),
        };
        let row = model.insert(&self.db).await?;
        debug!(movie_id = row.id, "movie stored");
        Ok(Movie::from(row))
    }

    pub async fn comments(&self, movie_id: Option<i32>) -> Result<Vec<Comment>, DbErr> {
        let mut select = comment::Entity::find();
        if let Some(movie_id) = movie_id {
            select = select.filter(comment::Column::MovieId.eq(movie_id));
        }
        let rows = select.order_by_asc(comment::Column::Id).all(&self.db).await?;
        rows.into_iter().map(comment_from_row).collect()
    }

    /// Comments attached to an existing movie with `from <= added_on <= to`.
    pub async fn comments_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Comment>, DbErr> {
        let rows = comment::Entity::find()
            .join(JoinType::InnerJoin, comment::Relation::Movie.def())
            .filter(comment::Column::AddedOn.between(from.as_microsecond(), to.as_microsecond()))
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?;
        rows.into_iter().map(comment_from_row).collect()
    }

    /// Inserts a comment unless the movie is missing, in which case `None` is
    /// returned and nothing is written.
    pub async fn insert_comment(
        &self,
        movie_id: i32,
        text: &str,
        added_on: Timestamp,
    ) -> Result<Option<Comment>, DbErr> {
        let txn = self.db.begin().await?;

        if movie::Entity::find_by_id(movie_id).one(&txn).await?.is_none() {
            txn.rollback().await?;
            return Ok(None);
        }

        let model = comment::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            comment: Set(text.to_string()),
            added_on: Set(added_on.as_microsecond()),
        };
        let row = model.insert(&txn).await?;

        txn.commit().await?;

        comment_from_row(row).map(Some)
    }
}

fn comment_from_row(row: comment::Model) -> Result<Comment, DbErr> {
    Comment::try_from(row).map_err(|err| DbErr::Type(err.to_string()))
}

/// Movies where any of `fields` contains `needle`, ignoring case.
pub fn filter_by_substring(movies: Vec<Movie>, fields: &[&str], needle: &str) -> Vec<Movie> {
    movies
        .into_iter()
        .filter(|m| fields.iter().any(|field| m.external_data.field_contains(field, needle)))
        .collect()
}

pub fn filter_by_year(movies: Vec<Movie>, year: &str) -> Vec<Movie> {
    movies.into_iter().filter(|m| m.external_data.field_equals("Year", year)).collect()
}

/// Sorts on an `external_data` field. Movies lacking the field go last when
/// ascending and first when descending; ties stay in primary-key order.
///
/// A field that no movie carries is not a sortable column, so the input comes
/// back untouched.
pub fn order_by_field(mut movies: Vec<Movie>, field: &str, descending: bool) -> Vec<Movie> {
    if field.is_empty() || !movies.iter().any(|m| m.external_data.get(field).is_some()) {
        debug!(field = %field, "ignoring unknown order field");
        return movies;
    }

    movies.sort_by(|a, b| {
        let ord = match (a.external_data.get(field), b.external_data.get(field)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = if descending { ord.reverse() } else { ord };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    movies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i32, fields: &[(&str, &str)]) -> Movie {
        Movie { id, external_data: fields.iter().copied().collect() }
    }

    fn ids(movies: &[Movie]) -> Vec<i32> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn substring_filter_matches_any_field() {
        let movies = vec![
            movie(1, &[("Title", "Star Wars"), ("Director", "George Lucas")]),
            movie(2, &[("Title", "Fight Club"), ("Director", "David Fincher")]),
            movie(3, &[("Title", "Cube")]),
        ];

        let found = filter_by_substring(movies, &["Title", "Director"], "LU");
        assert_eq!(ids(&found), vec![1, 2]);
    }

    #[test]
    fn year_filter_is_exact() {
        let movies = vec![
            movie(1, &[("Year", "2011-")]),
            movie(2, &[("Year", "2011")]),
            movie(3, &[]),
        ];

        assert_eq!(ids(&filter_by_year(movies, "2011")), vec![2]);
    }

    #[test]
    fn ordering_puts_missing_values_last_ascending() {
        let movies = vec![
            movie(1, &[("Title", "Matrix")]),
            movie(2, &[]),
            movie(3, &[("Title", "Cube")]),
            movie(4, &[("Title", "Cube")]),
        ];

        assert_eq!(ids(&order_by_field(movies.clone(), "Title", false)), vec![3, 4, 1, 2]);
        assert_eq!(ids(&order_by_field(movies, "Title", true)), vec![2, 1, 3, 4]);
    }

    #[test]
    fn unknown_order_field_keeps_input_order() {
        let movies = vec![movie(2, &[("Title", "B")]), movie(1, &[("Title", "A")])];

        assert_eq!(ids(&order_by_field(movies.clone(), "Ye ar", false)), vec![2, 1]);
        assert_eq!(ids(&order_by_field(movies, "", true)), vec![2, 1]);
    }
}
