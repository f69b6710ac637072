use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::{classify, StoreError};
use crate::movies::repo_types::{Movie, MovieChanges, NewMovie};

const MOVIE_COLUMNS: &str = "id, title, director, release_year, barcode, genre, rating";
const MOVIE_CONSTRAINTS: &[(&str, &str)] = &[("movies_barcode_key", "barcode")];

/// Movie store. Writes return the affected row from the same statement.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Movie>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Movie>, StoreError>;
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Movie>, StoreError>;
    async fn insert(&self, movie: NewMovie) -> Result<Movie, StoreError>;
    /// `Ok(None)` when no row has `id`.
    async fn update(&self, id: i64, changes: MovieChanges) -> Result<Option<Movie>, StoreError>;
    /// Whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgMovieStore {
    db: PgPool,
}

impl PgMovieStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn list(&self) -> Result<Vec<Movie>, StoreError> {
        let rows = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Movie>, StoreError> {
        let row = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE barcode = $1"
        ))
        .bind(barcode)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        sqlx::query_as::<_, Movie>(&format!(
            r#"
            INSERT INTO movies (title, director, release_year, barcode, genre, rating)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MOVIE_COLUMNS}
            "#
        ))
        .bind(movie.title)
        .bind(movie.director)
        .bind(movie.release_year)
        .bind(movie.barcode)
        .bind(movie.genre)
        .bind(movie.rating)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, MOVIE_CONSTRAINTS))
    }

    async fn update(&self, id: i64, changes: MovieChanges) -> Result<Option<Movie>, StoreError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE movies SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(title) = changes.title {
                set.push("title = ").push_bind_unseparated(title);
            }
            if let Some(director) = changes.director {
                set.push("director = ").push_bind_unseparated(director);
            }
            if let Some(year) = changes.release_year {
                set.push("release_year = ").push_bind_unseparated(year);
            }
            if let Some(barcode) = changes.barcode {
                set.push("barcode = ").push_bind_unseparated(barcode);
            }
            if let Some(genre) = changes.genre {
                set.push("genre = ").push_bind_unseparated(genre);
            }
            if let Some(rating) = changes.rating {
                set.push("rating = ").push_bind_unseparated(rating);
            }
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {MOVIE_COLUMNS}"));

        qb.build_query_as::<Movie>()
            .fetch_optional(&self.db)
            .await
            .map_err(|e| classify(e, MOVIE_CONSTRAINTS))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
