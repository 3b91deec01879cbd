use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Ordered photo URLs of one listing. Shared so the gallery can hold the
/// record's own sequence instead of a copy.
pub type PhotoSet = Arc<[String]>;

/// One catalog entry as sent by the backend in `flats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(default, deserialize_with = "display_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub infrastructure: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub mortgage_program: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub down_payment: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub contact_link: Option<String>,
    #[serde(default = "no_photos", deserialize_with = "photos_or_empty")]
    pub photos: PhotoSet,
}

fn no_photos() -> PhotoSet {
    Arc::from(Vec::new())
}

/// Display fields are shown as-is, so numbers and booleans are kept as their
/// text. Arrays and objects have no display form and count as absent.
fn display_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

/// `null` and non-string entries are dropped; the remaining URLs keep their order.
fn photos_or_empty<'de, D>(deserializer: D) -> Result<PhotoSet, D::Error>
where
    D: Deserializer<'de>,
{
    let photos: Vec<String> = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(Arc::from(photos))
}

/// Blank strings display the same as missing fields.
fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self {
            title: None,
            district: None,
            street: None,
            price: None,
            infrastructure: None,
            mortgage_program: None,
            down_payment: None,
            contact_link: None,
            photos: no_photos(),
        }
    }
}

impl ListingRecord {
    pub fn title(&self) -> Option<&str> {
        present(&self.title)
    }

    pub fn price(&self) -> Option<&str> {
        present(&self.price)
    }

    pub fn infrastructure(&self) -> Option<&str> {
        present(&self.infrastructure)
    }

    pub fn mortgage_program(&self) -> Option<&str> {
        present(&self.mortgage_program)
    }

    pub fn down_payment(&self) -> Option<&str> {
        present(&self.down_payment)
    }

    pub fn contact_link(&self) -> Option<&str> {
        present(&self.contact_link)
    }

    /// "district, street" with only the parts that are present.
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [present(&self.district), present(&self.street)]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_to_none() {
        let listing: ListingRecord = serde_json::from_str(r#"{ "title": "A" }"#).unwrap();

        assert_eq!(listing.title(), Some("A"));
        assert_eq!(listing.price(), None);
        assert_eq!(listing.location(), None);
        assert!(listing.photos.is_empty());
    }

    #[test]
    fn null_photos_become_empty() {
        let listing: ListingRecord =
            serde_json::from_str(r#"{ "photos": null, "contactLink": null }"#).unwrap();

        assert_eq!(listing.photo_count(), 0);
        assert_eq!(listing.contact_link(), None);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let listing: ListingRecord = serde_json::from_str(
            r#"{
                "mortgageProgram": "Family 6%",
                "downPayment": "20%",
                "contactLink": "https://example.com/1",
                "photos": ["u1", "u2", "u3"]
            }"#,
        )
        .unwrap();

        assert_eq!(listing.mortgage_program(), Some("Family 6%"));
        assert_eq!(listing.down_payment(), Some("20%"));
        assert_eq!(listing.contact_link(), Some("https://example.com/1"));
        assert_eq!(&*listing.photos, ["u1", "u2", "u3"]);
    }

    #[test]
    fn location_skips_blank_parts() {
        let listing = ListingRecord {
            district: Some("Center".to_string()),
            street: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(listing.location().as_deref(), Some("Center"));

        let listing = ListingRecord {
            district: Some("Center".to_string()),
            street: Some("Abay 10".to_string()),
            ..Default::default()
        };
        assert_eq!(listing.location().as_deref(), Some("Center, Abay 10"));
    }

    #[test]
    fn numeric_fields_keep_their_text() {
        let listing: ListingRecord = serde_json::from_str(
            r#"{ "title": "A", "price": 45000000, "downPayment": 20, "street": ["not", "text"] }"#,
        )
        .unwrap();

        assert_eq!(listing.price(), Some("45000000"));
        assert_eq!(listing.down_payment(), Some("20"));
        assert_eq!(listing.street, None);
    }

    #[test]
    fn bad_photo_entries_are_dropped() {
        let listing: ListingRecord =
            serde_json::from_str(r#"{ "photos": ["u1", null, 7, "u2"] }"#).unwrap();
        assert_eq!(&*listing.photos, ["u1", "u2"]);

        let listing: ListingRecord = serde_json::from_str(r#"{ "photos": "u1" }"#).unwrap();
        assert_eq!(listing.photo_count(), 0);
    }
}
