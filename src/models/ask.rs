use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ListingRecord;

/// Body of `POST /ask`.
#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

/// Reply of `POST /ask`. Both fields may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "listings_skipping_invalid")]
    pub flats: Option<Vec<ListingRecord>>,
}

/// Parses `flats` record by record. A record that cannot be read is logged and
/// skipped so the answer and the other listings still come through.
fn listings_skipping_invalid<'de, D>(deserializer: D) -> Result<Option<Vec<ListingRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!("Ignoring flats that is not a list: {}", other);
            return Ok(None);
        }
    };

    let listings = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<ListingRecord>(entry) {
            Ok(listing) => Some(listing),
            Err(e) => {
                tracing::warn!("Skipping listing {}: {}", i, e);
                None
            }
        })
        .collect();
    Ok(Some(listings))
}

impl AskResponse {
    /// The answer text, or `None` when missing or empty.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|answer| !answer.is_empty())
    }

    pub fn into_listings(self) -> Vec<ListingRecord> {
        self.flats.unwrap_or_default()
    }
}
