//! Identifier decoding helpers.
//!
//! Different schema tiers serialize ids as strings or as raw numbers.
//! Everything downstream (cache keys, dedupe sets, cross-endpoint joins)
//! compares ids as strings, so they are normalized at decode time.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Integer(n) => n.to_string(),
            RawId::Float(n) => {
                if n.fract() == 0.0 {
                    format!("{}", n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

/// Deserializes an id field that may arrive as a string or a number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawId::deserialize(deserializer)?.into_string())
}

/// Optional variant of [`string_or_number`].
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}

/// List variant of [`string_or_number`], used for `aggregationSeriesIds`.
pub fn vec_string_or_number<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Vec::<RawId>::deserialize(deserializer)?
        .into_iter()
        .map(RawId::into_string)
        .collect())
}
