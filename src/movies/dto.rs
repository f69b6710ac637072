use serde::{Deserialize, Deserializer, Serialize};

use crate::movies::repo_types::{Movie, MovieChanges, NewMovie};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub barcode: String,
    pub genre: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl From<CreateMovieRequest> for NewMovie {
    fn from(r: CreateMovieRequest) -> Self {
        Self {
            title: r.title,
            director: r.director,
            release_year: r.release_year,
            barcode: r.barcode,
            genre: r.genre,
            rating: r.rating,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub barcode: Option<String>,
    pub genre: Option<String>,
    // absent -> None, null -> Some(None)
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<f64>>,
}

fn present<'de, D>(d: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(d).map(Some)
}

impl From<UpdateMovieRequest> for MovieChanges {
    fn from(r: UpdateMovieRequest) -> Self {
        Self {
            title: r.title,
            director: r.director,
            release_year: r.release_year,
            barcode: r.barcode,
            genre: r.genre,
            rating: r.rating,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieQuery {
    pub barcode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovieList {
    pub items: Vec<Movie>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_missing_and_null_rating() {
        let absent: UpdateMovieRequest = serde_json::from_str(r#"{"title":"New Title"}"#).unwrap();
        assert_eq!(absent.title.as_deref(), Some("New Title"));
        assert_eq!(absent.rating, None);

        let null: UpdateMovieRequest = serde_json::from_str(r#"{"rating":null}"#).unwrap();
        assert_eq!(null.rating, Some(None));

        let set: UpdateMovieRequest = serde_json::from_str(r#"{"rating":7.5}"#).unwrap();
        assert_eq!(set.rating, Some(Some(7.5)));
    }

    #[test]
    fn create_accepts_camel_case_and_optional_rating() {
        let req: CreateMovieRequest = serde_json::from_str(
            r#"{"title":"Alien","director":"Ridley Scott","releaseYear":1979,"barcode":"024543617907","genre":"Sci-Fi"}"#,
        )
        .unwrap();
        assert_eq!(req.release_year, 1979);
        assert_eq!(req.rating, None);
    }

    #[test]
    fn movie_serializes_camel_case() {
        let movie = Movie {
            id: 3,
            title: "The Dark Knight".into(),
            director: "Christopher Nolan".into(),
            release_year: 2008,
            barcode: "085391174080".into(),
            genre: "Action".into(),
            rating: None,
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["releaseYear"], 2008);
        assert!(json["rating"].is_null());
    }
}
