mod api;
mod error;
mod images;
mod listing;
mod metadata;
mod models;
mod network;
pub mod player;
pub mod router;

pub use api::CatalogClient;
pub use error::{Result, VodError};
pub use images::select_images;
pub use listing::{ContentKind, DirectoryEntry, InfoLabels, ListingSink, SortMethod};
pub use metadata::{adapt_category, adapt_item, derive_title};
pub use models::*;
pub use network::{HttpClient, HttpFetch};
pub use player::{PlaybackResolver, Resolution, ResolveOutcome};
pub use router::{Action, Router};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 12) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.5060.53 Mobile Safari/537.36";

/// Upstream endpoints and tunables. One value per invocation, never mutated.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub api_base: String,
    pub main_category_id: u32,
    pub catalog_type: u32,
    pub category_from: u32,
    pub category_to: u32,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub embed_base: String,
    pub partner_id: u64,
    pub uiconf_id: u64,
    /// Flavors must be strictly taller than this to replace the default stream.
    pub quality_threshold: u32,
    pub plugin_title: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://pipes2.kan.org.il/api".to_string(),
            main_category_id: 3,
            catalog_type: 1,
            category_from: 1,
            category_to: 400,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            embed_base: "https://cdnapisec.kaltura.com".to_string(),
            partner_id: 2717431,
            uiconf_id: 45733501,
            quality_threshold: 720,
            plugin_title: "Kan11 VOD".to_string(),
        }
    }
}

impl CoreConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn embed_url(&self, entry_id: &str) -> String {
        format!(
            "{}/p/{p}/sp/{p}00/embedIframeJs/uiconf_id/{u}/partner_id/{p}?iframeembed=true&playerId=playerid_{u}&entry_id={}",
            self.embed_base.trim_end_matches('/'),
            urlencoding::encode(entry_id),
            p = self.partner_id,
            u = self.uiconf_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_url_matches_player_endpoint() {
        let cfg = CoreConfig::default();
        assert_eq!(
            cfg.embed_url("1_abc"),
            "https://cdnapisec.kaltura.com/p/2717431/sp/271743100/embedIframeJs/uiconf_id/45733501/partner_id/2717431?iframeembed=true&playerId=playerid_45733501&entry_id=1_abc"
        );
    }

    #[test]
    fn api_base_ignores_trailing_slash() {
        let cfg = CoreConfig { api_base: "http://localhost/api/".into(), ..Default::default() };
        assert_eq!(cfg.api_base(), "http://localhost/api");
    }
}
