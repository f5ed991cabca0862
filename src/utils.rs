/// Placeholder for any field that could not be derived.
pub const NA: &str = "N/A";

pub fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NA.to_string())
}

pub fn is_na(value: &str) -> bool {
    value == NA
}
