use std::fs::File;
use std::path::Path;

use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};

use crate::extract::MovieRecord;
use crate::utils::is_na;

pub const COLUMNS: [&str; 8] = [
    "Movie Name",
    "Year of Release",
    "Duration",
    "Genre",
    "IMBD Rating",
    "Director",
    "Cast",
    "Plot",
];

/// Render a genre list the way it is stored in the `Genre` column.
pub fn format_genres(genres: &[String]) -> String {
    serde_json::Value::from(genres.to_vec()).to_string()
}

/// Parse the `Genre` column back into its list. "N/A" is an empty list.
pub fn parse_genres(text: &str) -> Result<Vec<String>, serde_json::Error> {
    if is_na(text.trim()) {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
}

/// Write the whole library, header row first, replacing any existing file.
pub fn write_library(path: &Path, records: &[MovieRecord]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(file);
    // serialize() only emits the header alongside the first row
    if records.is_empty() {
        wtr.write_record(COLUMNS)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_library(path: &Path) -> anyhow::Result<Vec<MovieRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: MovieRecord = result.with_context(|| format!("reading {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}
