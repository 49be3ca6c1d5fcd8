//! Lenient field deserializers.
//!
//! Form-originated records store numbers as strings ("8") and leave
//! untouched inputs as "". Servers sometimes send integers as floats ("8.0").

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Float(f64),
    Text(String),
}

/// Accept a JSON number, a numeric string, a blank string or null.
///
/// A float where an integer is expected is kept when integral; otherwise the
/// field is dropped with a warning rather than failing the whole record.
pub fn number_or_string<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Float(f)) => {
            let integral = (f.is_finite() && f.fract() == 0.0)
                .then(|| format!("{f:.0}"))
                .and_then(|text| text.parse().ok());
            if integral.is_none() {
                warn!(value = f, "dropping non-integral number");
            }
            Ok(integral)
        }
        Some(NumberOrString::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse().map(Some).map_err(de::Error::custom)
            }
        }
    }
}

/// Treat "" (and whitespace) as an absent optional string.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
