// Held-item catalogue assembled from a set of item categories.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pokedex_core::pokemon::collapse_whitespace;

use crate::client::PokeApiClient;
use crate::dto::{ItemCategoryResponse, ItemResponse};

pub const NO_ITEM_DESCRIPTION: &str = "No description.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItem {
    /// Display name, hyphens replaced by spaces.
    pub name: String,
    pub url: String,
    pub description: String,
    pub sprite: Option<String>,
}

/// Item URLs across all categories, first occurrence wins.
pub fn unique_item_urls(categories: &[ItemCategoryResponse]) -> Vec<String> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .flat_map(|c| c.items.iter())
        .map(|item| item.url.clone())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Map one item payload. `url` is the canonical item URL.
pub fn held_item(item: &ItemResponse, url: String) -> HeldItem {
    let description = item
        .flavor_text_entries
        .iter()
        .find(|e| e.language.name == "en")
        .map(|e| collapse_whitespace(&e.text))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_ITEM_DESCRIPTION.to_string());

    HeldItem {
        name: item.name.replace('-', " "),
        url,
        description,
        sprite: item.sprites.default.clone(),
    }
}

impl PokeApiClient {
    /// Every item in the given categories, sorted by name. Categories and
    /// items that fail to load are skipped with a warning.
    pub async fn list_held_items(&self, categories: &[String]) -> Vec<HeldItem> {
        let loaded: Vec<ItemCategoryResponse> = stream::iter(categories)
            .map(|name| async move {
                let url = self.endpoint(&format!("item-category/{name}"));
                match self.get_json::<ItemCategoryResponse>(&url).await {
                    Ok(category) => Some(category),
                    Err(e) => {
                        warn!(category = %name, error = %e, "skipping item category");
                        None
                    }
                }
            })
            .buffered(self.concurrency())
            .filter_map(|c| async move { c })
            .collect()
            .await;

        let urls = unique_item_urls(&loaded);
        info!(categories = loaded.len(), items = urls.len(), "fetching held items");

        let mut items: Vec<HeldItem> = stream::iter(urls)
            .map(|url| async move {
                match self.get_json::<ItemResponse>(&url).await {
                    Ok(item) => {
                        let canonical = self.endpoint(&format!("item/{}/", item.id));
                        Some(held_item(&item, canonical))
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "skipping item");
                        None
                    }
                }
            })
            .buffered(self.concurrency())
            .filter_map(|i| async move { i })
            .collect()
            .await;

        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }
}
