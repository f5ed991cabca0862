use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::extract::MovieRecord;
use crate::library::{parse_genres, read_library};

/// How many movies each "Top 10" view returns.
pub const TOP_N: usize = 10;
const CLASSIC_BEFORE: i32 = 2000;

/// A library row with its year and rating parsed once at load time.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub movie: MovieRecord,
    pub year: Option<i32>,
    pub rating: Option<f64>,
}

impl From<MovieRecord> for CatalogEntry {
    fn from(movie: MovieRecord) -> Self {
        let year = movie.year.trim().parse().ok();
        let rating = movie.rating.trim().parse::<f64>().ok().filter(|r| r.is_finite());
        Self { movie, year, rating }
    }
}

/// Read-only snapshot of the movie library that every view queries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(records: Vec<MovieRecord>) -> Self {
        Self { entries: records.into_iter().map(CatalogEntry::from).collect() }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(read_library(path)?))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every genre that appears in the library, sorted.
pub fn unique_genres(catalog: &Catalog) -> Result<Vec<String>, serde_json::Error> {
    let mut genres = BTreeSet::new();
    for entry in catalog.entries() {
        genres.extend(parse_genres(&entry.movie.genre)?);
    }
    Ok(genres.into_iter().collect())
}

/// Pick one random movie whose genre column mentions `genre`, ignoring case.
pub fn suggest_by_genre<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    genre: &str,
    rng: &mut R,
) -> Option<&'a CatalogEntry> {
    let needle = genre.to_lowercase();
    let matches: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|entry| entry.movie.genre.to_lowercase().contains(&needle))
        .collect();
    matches.choose(rng).copied()
}

/// Highest rated first; unrated movies sort last.
pub fn top_rated(catalog: &Catalog) -> Vec<&CatalogEntry> {
    let mut entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
    entries.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
    entries.truncate(TOP_N);
    entries
}

/// Movies released before 2000, oldest first.
pub fn classics(catalog: &Catalog) -> Vec<&CatalogEntry> {
    let mut entries: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|entry| entry.year.is_some_and(|year| year < CLASSIC_BEFORE))
        .collect();
    entries.sort_by_key(|entry| entry.year);
    entries.truncate(TOP_N);
    entries
}

/// Newest first; movies without a year sort last.
pub fn latest(catalog: &Catalog) -> Vec<&CatalogEntry> {
    let mut entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
    entries.sort_by(|a, b| b.year.cmp(&a.year));
    entries.truncate(TOP_N);
    entries
}

/// The text block shown for one movie in the details pane.
pub fn movie_card(movie: &MovieRecord) -> String {
    format!(
        "{}\n{}   {}   Rating: {}\nDirector: {}\nCast: {}\nPlot: {}\n{}\n",
        movie.name,
        movie.year,
        movie.duration,
        movie.rating,
        movie.director,
        movie.cast,
        movie.plot,
        "-".repeat(40),
    )
}
