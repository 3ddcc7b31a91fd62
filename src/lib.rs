pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod omdb;
pub mod payload;
pub mod query;
pub mod ranking;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{Router, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{catalog::CatalogService, config::Config, omdb::MovieProvider, store::MovieStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: DatabaseConnection,
        provider: Arc<dyn MovieProvider>,
    ) -> Self {
        let store = MovieStore::new(db);
        let catalog = CatalogService::new(store.clone(), provider);
        Self { config, store, catalog }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/health", get(routes::health))
        .route("/movies", get(routes::list_movies).post(routes::create_movie))
        .route("/comments", get(routes::list_comments).post(routes::create_comment))
        .route("/top", get(routes::top))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
