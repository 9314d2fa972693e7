use serde::{Deserialize, Deserializer, Serialize};

/// A playable item.
///
/// Field names follow the player's own vocabulary; the aliases accept song
/// records exactly as the backend serializes them (`artist_name`,
/// `audio_url`, numeric ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(alias = "artist_name", default)]
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Where the audio lives: a path, a `file://` URI, or a remote URL.
    #[serde(alias = "audio_url", default)]
    pub media_url: Option<String>,
    /// Seconds; 0 until known.
    #[serde(default)]
    pub duration: f64,
}

impl Track {
    /// The media locator, if it is usable at all (present and non-blank).
    pub fn locator(&self) -> Option<&str> {
        self.media_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Uint(n) => n.to_string(),
    })
}
