use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppResult,
    movies::{
        dto::{CreateMovieRequest, MovieQuery, UpdateMovieRequest},
        repo_types::Movie,
    },
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}

/// GET /movies lists everything; GET /movies?barcode=X returns the single match.
#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    Query(q): Query<MovieQuery>,
) -> AppResult<Response> {
    match q.barcode.as_deref().filter(|b| !b.is_empty()) {
        Some(barcode) => {
            let movie = state.movies.search_by_barcode(barcode).await?;
            Ok(Json(movie).into_response())
        }
        None => Ok(Json(state.movies.get_all().await?).into_response()),
    }
}

#[instrument(skip(state))]
pub async fn get_movie(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.get_by_id(id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_movie(
    State(state): State<AppState>,
    Json(body): Json<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = state.movies.create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

#[instrument(skip(state, body))]
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateMovieRequest>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.movies.update(id, body.into()).await?))
}

#[instrument(skip(state))]
pub async fn delete_movie(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.movies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
