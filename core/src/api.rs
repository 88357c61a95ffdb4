use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{Result, VodError};
use crate::models::{CatalogResponse, CategoryRecord, ItemRecord};
use crate::network::HttpFetch;
use crate::CoreConfig;

/// Read-only access to the VOD catalog. Errors are returned, never swallowed.
pub struct CatalogClient<'a, F: HttpFetch + ?Sized> {
    fetch: &'a F,
    cfg: &'a CoreConfig,
}

impl<'a, F: HttpFetch + ?Sized> CatalogClient<'a, F> {
    pub fn new(fetch: &'a F, cfg: &'a CoreConfig) -> Self {
        Self { fetch, cfg }
    }

    pub fn categories_url(&self, range: &RangeInclusive<u32>) -> String {
        format!(
            "{}/main?mainCatId={}&catType={}&from={}&to={}",
            self.cfg.api_base(),
            self.cfg.main_category_id,
            self.cfg.catalog_type,
            range.start(),
            range.end()
        )
    }

    pub fn items_url(&self, category_id: &str) -> String {
        format!(
            "{}/item?catType={}&catId={}",
            self.cfg.api_base(),
            self.cfg.catalog_type,
            urlencoding::encode(category_id)
        )
    }

    pub fn fetch_categories(&self, range: RangeInclusive<u32>) -> Result<Vec<CategoryRecord>> {
        let entries = self.fetch_entries(&self.categories_url(&range))?;
        info!(count = entries.len(), "fetched categories");
        Ok(entries)
    }

    pub fn fetch_items(&self, category_id: &str) -> Result<Vec<ItemRecord>> {
        let entries = self.fetch_entries(&self.items_url(category_id))?;
        info!(category_id, count = entries.len(), "fetched items");
        Ok(entries)
    }

    fn fetch_entries<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        debug!(url, "getting catalog page");
        let body = self.fetch.get_text(url)?;
        let page: CatalogResponse<T> = serde_json::from_str(&body).map_err(|e| VodError::decode(url, e))?;
        Ok(page.entry)
    }
}
