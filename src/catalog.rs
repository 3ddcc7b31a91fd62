use std::sync::Arc;

use jiff::Timestamp;
use sea_orm::DbErr;
use tracing::{debug, info, warn};

use crate::{
    models::{CommentView, MovieView},
    omdb::MovieProvider,
    store::MovieStore,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Movie with id {0} does not exist.")]
    MovieNotFound(i32),
    /// Provider message, passed through untouched.
    #[error("{0}")]
    Provider(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Write side of the catalog: movie lookups backed by the external provider
/// and comment creation.
#[derive(Clone)]
pub struct CatalogService {
    store: MovieStore,
    provider: Arc<dyn MovieProvider>,
    clock: Clock,
}

impl CatalogService {
    pub fn new(store: MovieStore, provider: Arc<dyn MovieProvider>) -> Self {
        Self { store, provider, clock: Arc::new(Timestamp::now) }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the stored movie with this title, fetching and storing it on
    /// first request.
    ///
    /// Two concurrent requests for the same unseen title may both reach the
    /// provider and both insert.
    pub async fn get_or_create_movie_by_title(
        &self,
        title: &str,
    ) -> Result<MovieView, CatalogError> {
        if let Some(movie) = self.store.movie_by_title(title).await? {
            debug!(title = %title, movie_id = movie.id, "movie already stored");
            return Ok(movie.view());
        }

        let external_data = self.provider.fetch_movie(title).await.map_err(|message| {
            warn!(title = %title, error = %message, "provider lookup failed");
            CatalogError::Provider(message)
        })?;

        let movie = self.store.create_movie(external_data).await?;
        info!(title = %title, movie_id = movie.id, "movie created from provider data");
        Ok(movie.view())
    }

    pub async fn add_comment_to_movie(
        &self,
        movie_id: i32,
        text: &str,
    ) -> Result<CommentView, CatalogError> {
        // stored precision is microseconds
        let now = (self.clock)();
        let added_on = Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now);

        let comment = self
            .store
            .insert_comment(movie_id, text, added_on)
            .await?
            .ok_or(CatalogError::MovieNotFound(movie_id))?;

        debug!(movie_id = movie_id, comment_id = comment.id, "comment added");
        Ok(comment.view())
    }
}
