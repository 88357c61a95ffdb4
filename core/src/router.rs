//! Plugin invocation dispatch.
//!
//! The host calls the plugin with its own base URL and a query string. An
//! empty query lists categories; `action=listing` lists a category's videos;
//! `action=play` resolves a stream and hands it to the player.

use std::collections::HashMap;

use tracing::{info, warn};
use url::form_urlencoded;

use crate::api::CatalogClient;
use crate::error::{Result, VodError};
use crate::listing::{ContentKind, DirectoryEntry, ListingSink, SortMethod};
use crate::metadata::{adapt_category, adapt_item};
use crate::network::HttpFetch;
use crate::player::PlaybackResolver;
use crate::CoreConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListCategories,
    ListItems { id: String, title: String },
    Play { url: String },
}

impl Action {
    /// Parse a URL-encoded paramstring; a leading `?` is ignored.
    ///
    /// # Errors
    /// `VodError::InvalidRequest` for an unknown action or missing parameters.
    pub fn parse(paramstring: &str) -> Result<Self> {
        let query = paramstring.strip_prefix('?').unwrap_or(paramstring);
        let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        if params.is_empty() {
            return Ok(Action::ListCategories);
        }
        let param = |key: &str| {
            params
                .get(key)
                .cloned()
                .ok_or_else(|| VodError::invalid_request(format!("missing `{key}` in {paramstring}")))
        };
        match params.get("action").map(String::as_str) {
            Some("listing") => Ok(Action::ListItems { id: param("id")?, title: param("title").unwrap_or_default() }),
            Some("play") => Ok(Action::Play { url: param("url")? }),
            _ => Err(VodError::invalid_request(format!("unsupported paramstring: {paramstring}"))),
        }
    }

    /// Plugin URL that triggers this action when the host calls back.
    pub fn to_plugin_url(&self, base: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match self {
            Action::ListCategories => return base.to_string(),
            Action::ListItems { id, title } => {
                query.append_pair("action", "listing").append_pair("id", id).append_pair("title", title);
            }
            Action::Play { url } => {
                query.append_pair("action", "play").append_pair("url", url);
            }
        }
        format!("{base}?{}", query.finish())
    }
}

pub struct Router<'a, F: HttpFetch + ?Sized, S: ListingSink + ?Sized> {
    cfg: &'a CoreConfig,
    fetch: &'a F,
    sink: &'a mut S,
    plugin_url: &'a str,
}

impl<'a, F: HttpFetch + ?Sized, S: ListingSink + ?Sized> Router<'a, F, S> {
    pub fn new(cfg: &'a CoreConfig, fetch: &'a F, sink: &'a mut S, plugin_url: &'a str) -> Self {
        Self { cfg, fetch, sink, plugin_url }
    }

    pub fn dispatch(&mut self, paramstring: &str) -> Result<()> {
        let action = Action::parse(paramstring)?;
        info!(?action, "dispatching");
        match action {
            Action::ListCategories => self.list_categories(),
            Action::ListItems { id, title } => self.list_items(&id, &title),
            Action::Play { url } => self.play(&url),
        }
    }

    pub fn list_categories(&mut self) -> Result<()> {
        let catalog = CatalogClient::new(self.fetch, self.cfg);
        let records = self.close_on_error(catalog.fetch_categories(self.cfg.category_from..=self.cfg.category_to))?;

        self.sink.set_plugin_category(&self.cfg.plugin_title)?;
        self.sink.set_content(ContentKind::Videos)?;
        for category in records.iter().map(adapt_category) {
            let target = Action::ListItems { id: category.id.clone(), title: category.title.clone() };
            let entry = DirectoryEntry::folder(&category, target.to_plugin_url(self.plugin_url));
            self.sink.add_directory_item(&entry)?;
        }
        self.sink.add_sort_method(SortMethod::LabelIgnoreThe)?;
        self.sink.end_of_directory(true)
    }

    pub fn list_items(&mut self, category_id: &str, category_title: &str) -> Result<()> {
        let catalog = CatalogClient::new(self.fetch, self.cfg);
        let records = self.close_on_error(catalog.fetch_items(category_id))?;

        self.sink.set_plugin_category(category_title)?;
        self.sink.set_content(ContentKind::Videos)?;
        for record in &records {
            let item = match adapt_item(record) {
                Ok(Some(item)) => item,
                Ok(None) => continue,
                Err(e) => {
                    warn!(category_id, error = %e, "skipping catalog entry");
                    continue;
                }
            };
            let target = Action::Play { url: item.source.clone() };
            let entry = DirectoryEntry::playable(&item, target.to_plugin_url(self.plugin_url));
            self.sink.add_directory_item(&entry)?;
        }
        self.sink.end_of_directory(true)
    }

    /// Tell the host the listing failed so it does not wait for entries.
    fn close_on_error<T>(&mut self, fetched: Result<T>) -> Result<T> {
        if fetched.is_err() {
            if let Err(e) = self.sink.end_of_directory(false) {
                warn!(error = %e, "could not close failed listing");
            }
        }
        fetched
    }

    pub fn play(&mut self, reference: &str) -> Result<()> {
        let resolution = PlaybackResolver::new(self.fetch, self.cfg).resolve(reference);
        info!(url = %resolution.url, "final video");
        self.sink.set_resolved_url(&resolution.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paramstring_lists_categories() {
        assert_eq!(Action::parse("").unwrap(), Action::ListCategories);
        assert_eq!(Action::parse("?").unwrap(), Action::ListCategories);
    }

    #[test]
    fn listing_and_play_are_parsed() {
        assert_eq!(
            Action::parse("?action=listing&id=68&title=%D7%93%D7%A8%D7%9E%D7%94").unwrap(),
            Action::ListItems { id: "68".into(), title: "דרמה".into() }
        );
        assert_eq!(
            Action::parse("action=play&url=https%3A%2F%2Fcdn%2Fa.m3u8").unwrap(),
            Action::Play { url: "https://cdn/a.m3u8".into() }
        );
    }

    #[test]
    fn unknown_or_incomplete_actions_are_rejected() {
        assert!(matches!(Action::parse("action=delete"), Err(VodError::InvalidRequest { .. })));
        assert!(matches!(Action::parse("id=3"), Err(VodError::InvalidRequest { .. })));
        assert!(matches!(Action::parse("action=play"), Err(VodError::InvalidRequest { .. })));
    }

    #[test]
    fn plugin_urls_round_trip_through_parse() {
        let base = "plugin://plugin.video.kan11/";
        let play = Action::Play { url: "https://cdn/entryId/1_a/x.m3u8?x=1&y=2".into() };
        let url = play.to_plugin_url(base);
        assert!(url.starts_with("plugin://plugin.video.kan11/?action=play&url="));
        let query = url.split_once('?').unwrap().1;
        assert_eq!(Action::parse(query).unwrap(), play);
        assert_eq!(Action::ListCategories.to_plugin_url(base), base);
    }
}
