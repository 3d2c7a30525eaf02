//! Deserialization helpers for loosely shaped API fields.

use serde::{Deserialize, Deserializer};

/// Accept `"Face"`, `["Face", "Asian"]`, or `null` as a list of strings.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => split_list(&value),
        Some(OneOrMany::Many(values)) => values
            .into_iter()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .collect(),
    })
}

/// Accept either a bare id string or a populated object carrying `_id`.
pub fn id_or_object<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Populated {
        #[serde(rename = "_id")]
        id: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reference {
        Id(String),
        Object(Populated),
    }

    Ok(match Option::<Reference>::deserialize(deserializer)? {
        Some(Reference::Id(id)) => Some(id),
        Some(Reference::Object(obj)) => obj.id,
        None => None,
    })
}

/// Split a comma-separated list, trimming and dropping empty entries.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a status-like string, yielding `None` for missing or unknown values.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|s| s.parse().ok()))
}

/// Like [`lenient`] but falls back to the type's default.
pub fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Default,
{
    lenient(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::types::DeliveryStatus;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "one_or_many")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "id_or_object")]
        owner: Option<String>,
        #[serde(default, deserialize_with = "lenient_or_default")]
        status: DeliveryStatus,
    }

    #[test]
    fn test_comma_separated_string_splits() {
        let sample: Sample = serde_json::from_value(json!({"tags": "Face, Asian,,"})).unwrap();
        assert_eq!(sample.tags, vec!["Face", "Asian"]);
    }

    #[test]
    fn test_reference_forms() {
        let sample: Sample = serde_json::from_value(json!({"owner": "u1"})).unwrap();
        assert_eq!(sample.owner.as_deref(), Some("u1"));

        let sample: Sample =
            serde_json::from_value(json!({"owner": {"_id": "u2", "name": "Ada"}})).unwrap();
        assert_eq!(sample.owner.as_deref(), Some("u2"));

        let sample: Sample = serde_json::from_value(json!({"owner": null})).unwrap();
        assert!(sample.owner.is_none());
    }

    #[test]
    fn test_unknown_status_defaults() {
        let sample: Sample = serde_json::from_value(json!({"status": "Lost"})).unwrap();
        assert_eq!(sample.status, DeliveryStatus::Pending);

        let sample: Sample = serde_json::from_value(json!({"status": "shipped"})).unwrap();
        assert_eq!(sample.status, DeliveryStatus::Shipped);
    }
}
