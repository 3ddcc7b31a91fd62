use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    AppState,
    error::{AppError, AppResult, FIELD_REQUIRED, FieldErrors},
    models::{CommentQuery, CommentView, MovieQuery, MovieView, RankedMovie, Results, TopQuery},
    payload::Payload,
    query::{self, paginate},
    ranking::{DateWindow, rank_by_comments},
};

pub async fn home() -> Redirect {
    Redirect::to("/movies")
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "alive": true,
        "environment_type": state.config.environment,
    }))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<MovieQuery>,
) -> AppResult<Json<Results<MovieView>>> {
    let movies = state.store.movies().await?;
    let page = query::list_movies(movies, &q, state.config.page_size);
    Ok(Json(Results { results: page.iter().map(|m| m.view()).collect() }))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    body: Payload,
) -> AppResult<Json<MovieView>> {
    let mut errors = FieldErrors::new();
    let Some(title) = required("title", body.text("title"), &mut errors) else {
        return Err(AppError::Validation(errors));
    };

    let movie = state.catalog.get_or_create_movie_by_title(title).await?;
    Ok(Json(movie))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CommentQuery>,
) -> AppResult<Json<Results<CommentView>>> {
    let movie_id = query::parse_movie_filter(&q.movie).map_err(AppError::Validation)?;

    let comments = state.store.comments(movie_id).await?;
    let page = paginate(comments, q.page.as_deref(), state.config.page_size);
    Ok(Json(Results { results: page.iter().map(|c| c.view()).collect() }))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    body: Payload,
) -> AppResult<Json<CommentView>> {
    let mut errors = FieldErrors::new();
    let movie_id = required("movie", body.integer("movie"), &mut errors);
    let text = required("comment", body.text("comment"), &mut errors);
    let (Some(movie_id), Some(text)) = (movie_id, text) else {
        return Err(AppError::Validation(errors));
    };

    let comment = state.catalog.add_comment_to_movie(movie_id, text).await?;
    Ok(Json(comment))
}

pub async fn top(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TopQuery>,
) -> AppResult<Json<Results<RankedMovie>>> {
    let window =
        DateWindow::parse(q.from.as_deref(), q.to.as_deref()).map_err(AppError::InvalidQuery)?;

    let comments = state.store.comments_between(window.from, window.to).await?;
    let ranked = rank_by_comments(&comments);
    debug!(comments = comments.len(), movies = ranked.len(), "ranked comment window");

    let page = paginate(ranked, q.page.as_deref(), state.config.page_size);
    Ok(Json(Results { results: page }))
}

/// Records a missing or malformed body field under its name.
fn required<T>(
    field: &'static str,
    value: Result<Option<T>, &'static str>,
    errors: &mut FieldErrors,
) -> Option<T> {
    match value {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            errors.insert(field, FIELD_REQUIRED);
            None
        },
        Err(message) => {
            errors.insert(field, message);
            None
        },
    }
}
