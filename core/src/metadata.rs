use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Result, VodError};
use crate::images::select_images;
use crate::models::{Category, CategoryRecord, Item, ItemRecord};

const VIDEO: &str = "video";

static EPISODE_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^פרק \d+").expect("valid episode fragment pattern"));
static SEASON_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"עונה (\d+)").expect("valid season pattern"));
static EPISODE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"פרק (\d+)").expect("valid episode pattern"));

pub fn adapt_category(raw: &CategoryRecord) -> Category {
    Category {
        id: raw.id.clone(),
        title: raw.title.clone(),
        summary: raw.summary.clone(),
        images: select_images(&raw.media_group),
    }
}

/// Normalize one catalog entry.
///
/// `Ok(None)` for anything that is not a video. A video without a playable
/// source is a parse error; the caller decides whether to skip it.
pub fn adapt_item(raw: &ItemRecord) -> Result<Option<Item>> {
    if raw.kind.value != VIDEO {
        return Ok(None);
    }
    let source = raw
        .content
        .as_ref()
        .and_then(|c| c.src.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VodError::parse(format!("video '{}' has no content source", raw.title)))?;

    let aired = raw.published.split('T').next().unwrap_or_default().to_string();
    let year = aired_year(&aired);

    Ok(Some(Item {
        title: derive_title(&raw.title),
        season: marker_number(&SEASON_MARKER, &raw.title),
        episode: marker_number(&EPISODE_MARKER, &raw.title),
        plot_outline: raw.summary.clone(),
        plot: raw.extensions.on_demand.description.clone(),
        aired,
        year,
        show_title: raw.extensions.on_demand.show_name.clone(),
        duration: raw.extensions.duration.as_ref().and_then(duration_secs),
        images: select_images(&raw.media_group),
        source: source.to_string(),
    }))
}

/// Display title for an episode.
///
/// Takes the last non-empty `|` segment, splits it on `-` and prefers the
/// first fragment that is not a bare "פרק N". Empty fragments are ignored; if
/// none remain the title is empty.
pub fn derive_title(raw: &str) -> String {
    let tail = raw.split('|').map(str::trim).filter(|s| !s.is_empty()).last().unwrap_or_default();
    let mut fragments: Vec<&str> = tail.split('-').map(str::trim).filter(|f| !f.is_empty()).collect();
    // stable: keeps the original order inside each group
    fragments.sort_by_key(|f| EPISODE_FRAGMENT.is_match(f));
    fragments.first().map(|title| title.to_string()).unwrap_or_default()
}

fn marker_number(marker: &Regex, title: &str) -> u32 {
    marker
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

fn aired_year(aired: &str) -> Option<i32> {
    NaiveDate::parse_from_str(aired, "%Y-%m-%d")
        .map(|d| d.year())
        .ok()
        .or_else(|| aired.split('-').next().and_then(|y| y.trim().parse().ok()))
}

fn duration_secs(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
