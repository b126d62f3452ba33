use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One news record as published in the feed document.
///
/// Every field tolerates being absent so a sparse record degrades the card
/// instead of failing the feed.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alt_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_date: String,
    pub instagram_link: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub read_more_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub published: bool,
}

impl Article {
    /// Instagram link when present and not blank.
    pub fn instagram(&self) -> Option<&str> {
        self.instagram_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}
