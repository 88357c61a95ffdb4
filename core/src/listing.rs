use serde::Serialize;

use crate::error::Result;
use crate::models::{Category, ImageSet, Item};

const MEDIA_TYPE_VIDEO: &str = "video";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Videos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMethod {
    LabelIgnoreThe,
}

/// Video info labels understood by the host's list items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoLabels {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub plotoutline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aired: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvshowtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub mediatype: String,
}

/// One row of a directory listing: a sub-folder or a playable video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub label: String,
    pub url: String,
    pub info: InfoLabels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art: Option<ImageSet>,
    pub is_folder: bool,
    pub is_playable: bool,
}

impl DirectoryEntry {
    pub fn folder(category: &Category, url: String) -> Self {
        Self {
            label: category.title.clone(),
            url,
            info: InfoLabels {
                title: category.title.clone(),
                plotoutline: category.summary.clone(),
                mediatype: MEDIA_TYPE_VIDEO.to_string(),
                ..Default::default()
            },
            art: category.images.clone(),
            is_folder: true,
            is_playable: false,
        }
    }

    pub fn playable(item: &Item, url: String) -> Self {
        Self {
            label: item.title.clone(),
            url,
            info: InfoLabels {
                title: item.title.clone(),
                season: Some(item.season),
                episode: Some(item.episode),
                plotoutline: item.plot_outline.clone(),
                plot: Some(item.plot.clone()),
                aired: Some(item.aired.clone()),
                year: item.year,
                tvshowtitle: Some(item.show_title.clone()),
                duration: item.duration,
                mediatype: MEDIA_TYPE_VIDEO.to_string(),
            },
            art: item.images.clone(),
            is_folder: false,
            is_playable: true,
        }
    }
}

/// Destination for everything the plugin shows or plays.
///
/// The host runtime implements this; tests record the calls.
pub trait ListingSink {
    fn set_plugin_category(&mut self, label: &str) -> Result<()>;
    fn set_content(&mut self, kind: ContentKind) -> Result<()>;
    fn add_directory_item(&mut self, entry: &DirectoryEntry) -> Result<()>;
    fn add_sort_method(&mut self, method: SortMethod) -> Result<()>;
    /// Close the listing; `succeeded` is false when it could not be built.
    fn end_of_directory(&mut self, succeeded: bool) -> Result<()>;
    fn set_resolved_url(&mut self, url: &str) -> Result<()>;
}
