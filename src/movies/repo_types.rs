use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub barcode: String,
    pub genre: String,
    pub rating: Option<f64>,
}

/// Column values for a new row.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub barcode: String,
    pub genre: String,
    pub rating: Option<f64>,
}

/// Partial update. `None` leaves a column untouched; `rating: Some(None)`
/// clears the rating.
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub barcode: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<Option<f64>>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.director.is_none()
            && self.release_year.is_none()
            && self.barcode.is_none()
            && self.genre.is_none()
            && self.rating.is_none()
    }
}
