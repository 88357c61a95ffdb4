//! Playback URL resolution.
//!
//! Catalog entries point at a manifest URL. When that URL carries an
//! `entryId/<id>` segment, the video also exists on the embed player's
//! platform, which often advertises a taller flavor than the manifest serves.
//! The resolver runs these stages, any of which may stop with a fallback:
//!
//! detect entry id, fetch embed page, extract package data, select best
//! flavor, compare with the quality threshold, rewrite the manifest's
//! `flavorId/<id>` segment.
//!
//! A resolution always yields a usable URL. Every failure keeps the original
//! reference and is reported through [`ResolveOutcome::Fallback`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::error::VodError;
use crate::models::Flavor;
use crate::network::HttpFetch;
use crate::CoreConfig;

pub const ENTRY_ID_MARKER: &str = "entryId";
pub const FLAVOR_ID_MARKER: &str = "flavorId";
pub const PACKAGE_DATA_NEEDLE: &str = "window.kalturaIframePackageData = ";

/// Why the original reference was kept.
#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("`entryId` is not followed by an id")]
    MissingEntryId,
    #[error("embed request failed: {0}")]
    EmbedFetch(#[source] VodError),
    #[error("embed page has no package data assignment")]
    PackageDataMissing,
    #[error("package data is not valid JSON: {0}")]
    PackageDataDecode(#[source] serde_json::Error),
    #[error("package data has no flavor list: {0}")]
    PackageDataLayout(#[source] serde_json::Error),
    #[error("package data lists no flavors")]
    NoFlavors,
    #[error("manifest request failed: {0}")]
    ManifestFetch(#[source] VodError),
    #[error("manifest contains no URL line")]
    NoManifestUrl,
    #[error("manifest URL has no `flavorId` segment")]
    NoFlavorMarker,
    #[error("rewritten manifest URL is invalid: {0}")]
    InvalidRewrite(#[source] url::ParseError),
}

#[derive(Debug)]
pub enum ResolveOutcome {
    /// No embed entry referenced; nothing to upgrade.
    Direct,
    /// The best flavor is not taller than the threshold.
    BelowThreshold { height: u32 },
    Upgraded { flavor: Flavor },
    Fallback(FallbackReason),
}

/// Final playback URL plus how it was reached.
#[derive(Debug)]
pub struct Resolution {
    pub url: String,
    pub outcome: ResolveOutcome,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("needle not found")]
    NeedleNotFound,
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl From<ExtractError> for FallbackReason {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::NeedleNotFound => FallbackReason::PackageDataMissing,
            ExtractError::Decode(e) => FallbackReason::PackageDataDecode(e),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageData {
    entry_result: EntryResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryResult {
    context_data: ContextData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextData {
    flavor_assets: Vec<Flavor>,
}

enum Upgrade {
    Kept { height: u32 },
    Rewritten { url: String, flavor: Flavor },
}

pub struct PlaybackResolver<'a, F: HttpFetch + ?Sized> {
    fetch: &'a F,
    cfg: &'a CoreConfig,
}

impl<'a, F: HttpFetch + ?Sized> PlaybackResolver<'a, F> {
    pub fn new(fetch: &'a F, cfg: &'a CoreConfig) -> Self {
        Self { fetch, cfg }
    }

    pub fn resolve(&self, reference: &str) -> Resolution {
        info!(reference, "resolving playback");
        let Some(entry) = entry_id(reference) else {
            return Resolution { url: reference.to_string(), outcome: ResolveOutcome::Direct };
        };

        let outcome = entry
            .ok_or(FallbackReason::MissingEntryId)
            .and_then(|id| self.upgrade(reference, id));

        match outcome {
            Ok(Upgrade::Rewritten { url, flavor }) => {
                info!(%url, flavor = %flavor.id, height = flavor.height, "upgraded playback flavor");
                Resolution { url, outcome: ResolveOutcome::Upgraded { flavor } }
            }
            Ok(Upgrade::Kept { height }) => {
                info!(height, threshold = self.cfg.quality_threshold, "default stream kept");
                Resolution { url: reference.to_string(), outcome: ResolveOutcome::BelowThreshold { height } }
            }
            Err(reason) => {
                warn!(reference, %reason, "flavor upgrade failed, using original stream");
                Resolution { url: reference.to_string(), outcome: ResolveOutcome::Fallback(reason) }
            }
        }
    }

    fn upgrade(&self, reference: &str, entry_id: &str) -> Result<Upgrade, FallbackReason> {
        let embed_url = self.cfg.embed_url(entry_id);
        let page = self.fetch.get_text(&embed_url).map_err(FallbackReason::EmbedFetch)?;
        let package = extract_inline_json(&page, PACKAGE_DATA_NEEDLE)?;
        let best = best_flavor(package)?;
        if best.height <= self.cfg.quality_threshold {
            return Ok(Upgrade::Kept { height: best.height });
        }

        let manifest = self.fetch.get_text(reference).map_err(FallbackReason::ManifestFetch)?;
        let line = last_url_line(&manifest).ok_or(FallbackReason::NoManifestUrl)?;
        let url = replace_flavor(line, &best.id).ok_or(FallbackReason::NoFlavorMarker)?;
        Url::parse(&url).map_err(FallbackReason::InvalidRewrite)?;
        Ok(Upgrade::Rewritten { url, flavor: best })
    }
}

/// `None` when the reference has no `entryId` segment at all,
/// `Some(None)` when the marker is last or followed by an empty segment.
fn entry_id(reference: &str) -> Option<Option<&str>> {
    let mut segments = reference.split('/');
    segments.position(|s| s == ENTRY_ID_MARKER)?;
    Some(segments.next().filter(|id| !id.is_empty()))
}

/// Decode the JSON assigned on the first line containing `needle`.
///
/// The payload runs from the end of the needle to the end of the line, minus
/// the trailing `;` statement terminator.
pub fn extract_inline_json(body: &str, needle: &str) -> Result<Value, ExtractError> {
    let line = body.lines().find(|l| l.contains(needle)).ok_or(ExtractError::NeedleNotFound)?;
    let start = line.find(needle).map(|i| i + needle.len()).unwrap_or(line.len());
    let payload = line[start..].trim_end();
    let payload = payload.strip_suffix(';').unwrap_or(payload);
    Ok(serde_json::from_str(payload)?)
}

fn best_flavor(package: Value) -> Result<Flavor, FallbackReason> {
    let data: PackageData = serde_json::from_value(package).map_err(FallbackReason::PackageDataLayout)?;
    let mut flavors = data.entry_result.context_data.flavor_assets;
    flavors.sort_by_key(|f| f.height);
    flavors.pop().ok_or(FallbackReason::NoFlavors)
}

fn last_url_line(manifest: &str) -> Option<&str> {
    manifest.lines().map(str::trim).filter(|l| l.contains("http")).last()
}

/// Swap the segment after `flavorId` for `flavor_id`, leaving every other
/// segment untouched.
fn replace_flavor(url: &str, flavor_id: &str) -> Option<String> {
    let mut segments: Vec<&str> = url.split('/').collect();
    let marker = segments.iter().position(|s| *s == FLAVOR_ID_MARKER)?;
    let slot = segments.get_mut(marker + 1)?;
    *slot = flavor_id;
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::error::Result;

    const REFERENCE: &str = "https://kan-vod.example/hls/entryId/1_abcd/format/applehttp/a.m3u8";
    const MANIFEST: &str = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nhttps://cdn.example/p/1/sp/100/playManifest/entryId/1_abcd/flavorId/old123/format/applehttp/a.m3u8\n";

    /// Canned bodies by URL; unknown URLs fail like an unreachable host.
    #[derive(Default)]
    struct FakeFetch {
        bodies: HashMap<String, String>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeFetch {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl HttpFetch for FakeFetch {
        fn get_text(&self, url: &str) -> Result<String> {
            self.requested.borrow_mut().push(url.to_string());
            self.bodies.get(url).cloned().ok_or_else(|| VodError::network(url, "connection refused"))
        }
    }

    fn embed_page(flavors: &str) -> String {
        format!(
            "<html><script>\nvar x = 1;\n{PACKAGE_DATA_NEEDLE}{{\"entryResult\":{{\"contextData\":{{\"flavorAssets\":{flavors}}}}}}};\n</script></html>"
        )
    }

    fn resolve(fetch: &FakeFetch) -> Resolution {
        let cfg = CoreConfig::default();
        PlaybackResolver::new(fetch, &cfg).resolve(REFERENCE)
    }

    fn embed_url() -> String {
        CoreConfig::default().embed_url("1_abcd")
    }

    #[test]
    fn reference_without_entry_id_is_direct() {
        let fetch = FakeFetch::default();
        let cfg = CoreConfig::default();
        let res = PlaybackResolver::new(&fetch, &cfg).resolve("https://cdn/video.mp4");
        assert_eq!(res.url, "https://cdn/video.mp4");
        assert!(matches!(res.outcome, ResolveOutcome::Direct));
        assert!(fetch.requested.borrow().is_empty());
    }

    #[test]
    fn trailing_entry_id_marker_falls_back() {
        let fetch = FakeFetch::default();
        let cfg = CoreConfig::default();
        let res = PlaybackResolver::new(&fetch, &cfg).resolve("https://cdn/entryId/");
        assert_eq!(res.url, "https://cdn/entryId/");
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::MissingEntryId)));
    }

    #[test]
    fn embed_fetch_failure_keeps_reference() {
        let fetch = FakeFetch::default();
        let res = resolve(&fetch);
        assert_eq!(res.url, REFERENCE);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::EmbedFetch(_))));
        assert_eq!(*fetch.requested.borrow(), vec![embed_url()]);
    }

    #[test]
    fn page_without_package_data_keeps_reference() {
        let fetch = FakeFetch::default().with(&embed_url(), "<html>nothing here</html>");
        let res = resolve(&fetch);
        assert_eq!(res.url, REFERENCE);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::PackageDataMissing)));
    }

    #[test]
    fn broken_package_json_keeps_reference() {
        let page = format!("{PACKAGE_DATA_NEEDLE}{{\"entryResult\": ;");
        let fetch = FakeFetch::default().with(&embed_url(), &page);
        let res = resolve(&fetch);
        assert_eq!(res.url, REFERENCE);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::PackageDataDecode(_))));
    }

    #[test]
    fn unexpected_package_layout_keeps_reference() {
        let page = format!("{PACKAGE_DATA_NEEDLE}{{\"entryResult\":{{}}}};");
        let fetch = FakeFetch::default().with(&embed_url(), &page);
        let res = resolve(&fetch);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::PackageDataLayout(_))));
        assert_eq!(res.url, REFERENCE);
    }

    #[test]
    fn empty_flavor_list_keeps_reference() {
        let fetch = FakeFetch::default().with(&embed_url(), &embed_page("[]"));
        let res = resolve(&fetch);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::NoFlavors)));
        assert_eq!(res.url, REFERENCE);
    }

    #[test]
    fn best_flavor_at_or_below_threshold_keeps_reference() {
        let flavors = r#"[{"id":"1_hi","height":480},{"id":"1_lo","height":360}]"#;
        let fetch = FakeFetch::default().with(&embed_url(), &embed_page(flavors));
        let res = resolve(&fetch);
        assert_eq!(res.url, REFERENCE);
        assert!(matches!(res.outcome, ResolveOutcome::BelowThreshold { height: 480 }));
        assert_eq!(fetch.requested.borrow().len(), 1);

        let flavors = r#"[{"id":"1_hd","height":720}]"#;
        let fetch = FakeFetch::default().with(&embed_url(), &embed_page(flavors));
        assert!(matches!(resolve(&fetch).outcome, ResolveOutcome::BelowThreshold { height: 720 }));
    }

    #[test]
    fn manifest_fetch_failure_keeps_reference() {
        let flavors = r#"[{"id":"new456","height":1080}]"#;
        let fetch = FakeFetch::default().with(&embed_url(), &embed_page(flavors));
        let res = resolve(&fetch);
        assert_eq!(res.url, REFERENCE);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::ManifestFetch(_))));
        assert_eq!(*fetch.requested.borrow(), vec![embed_url(), REFERENCE.to_string()]);
    }

    #[test]
    fn manifest_without_url_keeps_reference() {
        let flavors = r#"[{"id":"new456","height":1080}]"#;
        let fetch = FakeFetch::default()
            .with(&embed_url(), &embed_page(flavors))
            .with(REFERENCE, "#EXTM3U\n#EXT-X-ENDLIST\n");
        let res = resolve(&fetch);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::NoManifestUrl)));
        assert_eq!(res.url, REFERENCE);
    }

    #[test]
    fn manifest_without_flavor_marker_keeps_reference() {
        let flavors = r#"[{"id":"new456","height":1080}]"#;
        let fetch = FakeFetch::default()
            .with(&embed_url(), &embed_page(flavors))
            .with(REFERENCE, "#EXTM3U\nhttps://cdn.example/plain/a.m3u8\n");
        let res = resolve(&fetch);
        assert!(matches!(res.outcome, ResolveOutcome::Fallback(FallbackReason::NoFlavorMarker)));
        assert_eq!(res.url, REFERENCE);
    }

    #[test]
    fn tall_flavor_rewrites_manifest_segment() {
        let flavors = r#"[{"id":"mid","height":720},{"id":"new456","height":1080},{"id":"low","height":360}]"#;
        let fetch = FakeFetch::default()
            .with(&embed_url(), &embed_page(flavors))
            .with(REFERENCE, MANIFEST);
        let res = resolve(&fetch);
        assert_eq!(
            res.url,
            "https://cdn.example/p/1/sp/100/playManifest/entryId/1_abcd/flavorId/new456/format/applehttp/a.m3u8"
        );
        match res.outcome {
            ResolveOutcome::Upgraded { flavor } => assert_eq!(flavor, Flavor { id: "new456".into(), height: 1080 }),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn last_url_line_is_used() {
        let manifest = "http://first/flavorId/a/x.m3u8\r\nnoise\r\nhttp://second/flavorId/b/y.m3u8\r\n";
        assert_eq!(last_url_line(manifest), Some("http://second/flavorId/b/y.m3u8"));
    }

    #[test]
    fn only_the_marked_segment_is_replaced() {
        let url = "https://cdn/old123/flavorId/old123/old123.m3u8";
        assert_eq!(replace_flavor(url, "new456").unwrap(), "https://cdn/old123/flavorId/new456/old123.m3u8");
        assert_eq!(replace_flavor("https://cdn/flavorId", "new456"), None);
    }

    #[test]
    fn inline_json_strips_terminator() {
        let body = "a\n  var cfg = {\"k\": [1, 2]};  \nb";
        let value = extract_inline_json(body, "var cfg = ").unwrap();
        assert_eq!(value["k"][1], 2);
        assert!(matches!(extract_inline_json(body, "missing = "), Err(ExtractError::NeedleNotFound)));
    }

    #[test]
    fn entry_id_detection() {
        assert_eq!(entry_id("https://x/entryId/1_a/b"), Some(Some("1_a")));
        assert_eq!(entry_id("https://x/entryId"), Some(None));
        assert_eq!(entry_id("https://x/entryIds/1_a"), None);
    }
}
