//! Serde adapters for request fields
//!
//! - `nullable` keeps an explicit JSON `null` apart from a missing field
//! - `lenient_count` accepts form values posted as numeric strings

use serde::{de, Deserialize, Deserializer};

/// Deserialize `Option<Option<T>>` so that a missing field stays `None`
/// (pair with `#[serde(default)]`) and `null` becomes `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

/// Deserialize an optional integer given as a JSON number or a numeric
/// string. `null` and blank strings mean "not provided".
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid number '{}'", text)))
        }
    }
}
