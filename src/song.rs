//! `[Song]` metadata.
//!
//! The section's key/value pairs are gathered into a YAML mapping, each value
//! read as a YAML scalar, and deserialized into [`SongInfo`]. Quoted strings
//! lose their quotes and numbers come out typed, so `Resolution = 192` and
//! `Name = "Song"` need no hand parsing.

use crate::error::ChartError;
use crate::tokenizer::Section;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Metadata declared in `[Song]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub charter: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub music_stream: Option<String>,
    /// Ticks per quarter note.
    pub resolution: Option<u32>,
    /// Audio offset in seconds.
    pub offset: Option<f64>,
    pub preview_start: Option<f64>,
    pub difficulty: Option<u32>,
    /// Every pair as written, first occurrence per key.
    pub extra: BTreeMap<String, String>,
}

/// Raw metadata for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
struct RawSongInfo {
    #[serde(default, deserialize_with = "scalar_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    artist: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    charter: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    album: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    year: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    genre: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    music_stream: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    resolution: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    offset: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    preview_start: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    difficulty: Option<u32>,
}

impl SongInfo {
    pub fn from_section(section: &Section) -> Result<Self, ChartError> {
        let mut mapping = Mapping::new();
        let mut extra = BTreeMap::new();
        for kv in &section.pairs {
            if extra.contains_key(&kv.key) {
                continue;
            }
            extra.insert(kv.key.clone(), kv.value.clone());
            mapping.insert(Value::String(kv.key.clone()), scalar_value(&kv.value));
        }

        let parsed: RawSongInfo = serde_yaml::from_value(Value::Mapping(mapping))
            .map_err(|e| ChartError::Metadata(e.to_string()))?;

        Ok(Self {
            name: parsed.name,
            artist: parsed.artist,
            charter: parsed.charter,
            album: parsed.album,
            year: parsed.year,
            genre: parsed.genre,
            music_stream: parsed.music_stream,
            resolution: parsed.resolution,
            offset: parsed.offset,
            preview_start: parsed.preview_start,
            difficulty: parsed.difficulty,
            extra,
        })
    }

    /// The tick resolution, which every time conversion needs.
    pub fn require_resolution(&self) -> Result<u32, ChartError> {
        match self.resolution {
            Some(r) if r > 0 => Ok(r),
            _ => Err(ChartError::MissingResolution),
        }
    }

    /// `Offset` in milliseconds (0 when absent).
    pub fn offset_ms(&self) -> f64 {
        self.offset.unwrap_or(0.0) * 1000.0
    }
}

/// Read a chart value as a YAML scalar, falling back to the literal text.
fn scalar_value(text: &str) -> Value {
    match serde_yaml::from_str::<Value>(text) {
        Ok(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(strip_quotes(text).to_string()),
    }
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    })
}
