use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    db::StoreError,
    error::{AppError, AppResult},
    movies::{
        dto::MovieList,
        repo::MovieStore,
        repo_types::{Movie, MovieChanges, NewMovie},
    },
};

#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieStore>,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieStore>) -> Self {
        Self { movies }
    }

    pub async fn get_all(&self) -> AppResult<MovieList> {
        let items = self.movies.list().await?;
        Ok(MovieList {
            count: items.len(),
            items,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Movie> {
        self.movies
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))
    }

    /// Exact barcode match.
    pub async fn search_by_barcode(&self, barcode: &str) -> AppResult<Movie> {
        self.movies
            .find_by_barcode(barcode)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No movie with barcode {barcode} exists")))
    }

    #[instrument(skip(self, movie), fields(barcode = %movie.barcode))]
    pub async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        let barcode = movie.barcode.clone();
        let created = self
            .movies
            .insert(movie)
            .await
            .map_err(|e| duplicate_barcode(e, &barcode))?;
        info!(movie_id = created.id, "movie created");
        Ok(created)
    }

    /// Only the supplied fields change.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: MovieChanges) -> AppResult<Movie> {
        let barcode = changes.barcode.clone().unwrap_or_default();
        let updated = self
            .movies
            .update(id, changes)
            .await
            .map_err(|e| duplicate_barcode(e, &barcode))?
            .ok_or_else(|| not_found_id(id))?;
        info!(movie_id = id, "movie updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.movies.delete(id).await? {
            return Err(not_found_id(id));
        }
        info!(movie_id = id, "movie deleted");
        Ok(())
    }
}

fn not_found_id(id: i64) -> AppError {
    AppError::NotFound(format!("No movie with id {id} exists"))
}

fn duplicate_barcode(err: StoreError, barcode: &str) -> AppError {
    match err {
        StoreError::Duplicate("barcode") => {
            AppError::Conflict(format!("Movie with barcode {barcode} already exists"))
        }
        other => other.into(),
    }
}
