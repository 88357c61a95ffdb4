use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Envelope shared by the `main` and `item` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResponse<T> {
    pub entry: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub media_group: Vec<MediaGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "type", default)]
    pub kind: ItemType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub extensions: Extensions,
    #[serde(default)]
    pub media_group: Vec<MediaGroup>,
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemType {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extensions {
    #[serde(default)]
    pub on_demand: OnDemand,
    #[serde(default)]
    pub duration: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnDemand {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub show_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaGroup {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub media_item: Vec<MediaItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub src: String,
}

/// Artwork for one listing entry. Either every role is filled or there is no set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub poster: String,
    pub thumb: String,
    pub icon: String,
    pub landscape: String,
    pub fanart: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub images: Option<ImageSet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub season: u32,
    pub episode: u32,
    pub plot_outline: String,
    pub plot: String,
    pub aired: String,
    pub year: Option<i32>,
    pub show_title: String,
    pub duration: Option<u64>,
    pub images: Option<ImageSet>,
    pub source: String,
}

/// One encoded quality variant advertised by the embed player data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub height: u32,
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}
