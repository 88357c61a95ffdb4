use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ImageSet, MediaGroup, MediaItem};

const IMAGE: &str = "image";
const KEY_BASE: &str = "image_base";
const KEY_POSTER: &str = "image_base_2x3";
const KEY_SQUARE: &str = "image_base_1x1";
const KEY_LANDSCAPE: &str = "image_base_16x9";

// `..._A.jpg` is the reduced rendition of `..._B.jpg` on the image CDN.
static LOW_RES_VARIANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(imgid=\d+)_A(\..+)$").expect("valid image variant pattern"));

/// Pick artwork for every role from the first `image` media group.
///
/// Missing ratios fall back to `image_base`. Returns `None` when there is no
/// image group, or when some role can be filled neither by its own ratio nor
/// by the base image.
pub fn select_images(groups: &[MediaGroup]) -> Option<ImageSet> {
    let group = groups.iter().find(|g| g.kind == IMAGE)?;
    let base = find_image(&group.media_item, KEY_BASE);

    let poster = find_image(&group.media_item, KEY_POSTER).or(base)?;
    let square = find_image(&group.media_item, KEY_SQUARE).or(base)?;
    let landscape = find_image(&group.media_item, KEY_LANDSCAPE).or(base)?;
    let landscape = high_res_variant(landscape);

    Some(ImageSet {
        poster: poster.to_string(),
        thumb: square.to_string(),
        icon: square.to_string(),
        fanart: landscape.clone(),
        landscape,
    })
}

fn find_image<'a>(items: &'a [MediaItem], key: &str) -> Option<&'a str> {
    items
        .iter()
        .find(|m| m.kind == IMAGE && m.key == key)
        .map(|m| m.src.as_str())
}

pub(crate) fn high_res_variant(src: &str) -> String {
    LOW_RES_VARIANT.replace(src, "${1}_B${2}").into_owned()
}
