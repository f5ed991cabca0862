use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::library::format_genres;
use crate::utils::or_na;

const TOP_CAST: usize = 3;

/// A JSON-LD value that may be given as a single entry or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Deserialize an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRating {
    pub rating_value: Option<serde_json::Value>,
}

/// The subset of a detail page's JSON-LD `Movie` object we read.
/// Every key is optional; absence is resolved in [`extract`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItemRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date_published: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub genre: Option<OneOrMany<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub aggregate_rating: Option<AggregateRating>,
    #[serde(default, deserialize_with = "lenient")]
    pub director: Option<OneOrMany<Person>>,
    #[serde(default, deserialize_with = "lenient")]
    pub actor: Option<OneOrMany<Person>>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

/// One row of the movie library. Every field holds a value or "N/A".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "Movie Name")]
    pub name: String,
    #[serde(rename = "Year of Release")]
    pub year: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    /// Printed list literal, e.g. `["Crime","Drama"]`.
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "IMBD Rating")]
    pub rating: String,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Cast")]
    pub cast: String,
    #[serde(rename = "Plot")]
    pub plot: String,
}

pub fn extract(record: RawItemRecord) -> MovieRecord {
    MovieRecord {
        name: or_na(record.name),
        year: or_na(record.date_published.as_deref().and_then(release_year)),
        duration: or_na(record.duration.as_deref().and_then(format_duration)),
        genre: or_na(record.genre.map(|g| format_genres(&g.into_vec()))),
        rating: or_na(record.aggregate_rating.and_then(|r| rating_text(r.rating_value?))),
        director: or_na(first_director(record.director)),
        cast: or_na(top_cast(record.actor)),
        plot: or_na(record.description),
    }
}

fn release_year(date: &str) -> Option<String> {
    let year: String = date.chars().take(4).collect();
    (!year.is_empty()).then_some(year)
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^PT(?:(\d*)H)?(?:(\d*)M)?").expect("duration pattern compiles"))
}

/// `PT2H15M` -> `2h 15m`. Missing or empty hour/minute digits count as 0.
///
/// Either unit may be left out entirely, so `PT45M` gives `0h 45m` and
/// `PT2H` gives `2h 0m`; a bare `PT` is rejected.
pub fn format_duration(raw: &str) -> Option<String> {
    let caps = duration_pattern().captures(raw)?;
    let (hours, minutes) = (caps.get(1), caps.get(2));
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    let digits = |m: Option<regex::Match>| match m.map(|m| m.as_str()) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => "0".to_string(),
    };
    Some(format!("{}h {}m", digits(hours), digits(minutes)))
}

/// A rating is kept only when it is a finite number; "NaN" and "inf" are not ratings.
fn rating_text(value: serde_json::Value) -> Option<String> {
    let is_finite = |s: &str| s.parse::<f64>().is_ok_and(f64::is_finite);
    match value {
        serde_json::Value::Number(n) => n.as_f64().is_some_and(f64::is_finite).then(|| n.to_string()),
        serde_json::Value::String(s) if is_finite(s.trim()) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn first_director(directors: Option<OneOrMany<Person>>) -> Option<String> {
    directors?.into_vec().into_iter().next()?.name
}

fn top_cast(actors: Option<OneOrMany<Person>>) -> Option<String> {
    let names: Vec<String> = actors?
        .into_vec()
        .into_iter()
        .take(TOP_CAST)
        .filter_map(|actor| actor.name)
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}
