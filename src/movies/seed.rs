use tracing::{debug, info};

use crate::{db::StoreError, movies::repo::MovieStore, movies::repo_types::NewMovie};

fn demo_catalogue() -> Vec<NewMovie> {
    let movie = |title: &str, director: &str, year: i32, barcode: &str, genre: &str, rating: f64| {
        NewMovie {
            title: title.into(),
            director: director.into(),
            release_year: year,
            barcode: barcode.into(),
            genre: genre.into(),
            rating: Some(rating),
        }
    };
    vec![
        movie("The Shawshank Redemption", "Frank Darabont", 1994, "883929305773", "Drama", 9.3),
        movie("The Godfather", "Francis Ford Coppola", 1972, "097363344049", "Crime", 9.2),
        movie("The Dark Knight", "Christopher Nolan", 2008, "085391174080", "Action", 9.0),
        movie("Pulp Fiction", "Quentin Tarantino", 1994, "031398187486", "Crime", 8.9),
        movie("Inception", "Christopher Nolan", 2010, "883929044511", "Sci-Fi", 8.8),
    ]
}

/// Inserts the demo catalogue, skipping barcodes already present.
/// Returns how many rows were inserted.
pub async fn seed_movies(store: &dyn MovieStore) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for movie in demo_catalogue() {
        let barcode = movie.barcode.clone();
        match store.insert(movie).await {
            Ok(_) => inserted += 1,
            Err(StoreError::Duplicate(_)) => debug!(%barcode, "seed movie already present"),
            Err(e) => return Err(e.into()),
        }
    }
    info!(inserted, "demo movies seeded");
    Ok(inserted)
}
