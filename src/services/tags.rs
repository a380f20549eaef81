//! Tag bookkeeping

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::database::TagStore;
use crate::models::tag::{diff_tags, filter_matching, is_predefined, TagDiff, PREDEFINED_TAGS};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn TagStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// Count one more use of each custom tag
    pub async fn register(&self, tags: &[String]) -> Result<()> {
        for tag in tags.iter().filter(|t| !is_predefined(t)) {
            let count = self.store.increment(tag).await?;
            debug!(tag = %tag, usage_count = count, "Tag registered");
        }
        Ok(())
    }

    pub async fn release(&self, tags: &[String]) -> Result<()> {
        for tag in tags.iter().filter(|t| !is_predefined(t)) {
            let count = self.store.decrement(tag).await?;
            debug!(tag = %tag, usage_count = count, "Tag released");
        }
        Ok(())
    }

    /// Apply the difference between two normalized tag lists
    pub async fn update(&self, old: &[String], new: &[String]) -> Result<TagDiff> {
        let diff = diff_tags(old, new);
        self.register(&diff.added).await?;
        self.release(&diff.removed).await?;
        Ok(diff)
    }

    /// Predefined tags first, then custom tags still in use
    pub async fn all_tags(&self) -> Result<Vec<String>> {
        let custom: BTreeSet<String> = self
            .store
            .custom_tags()
            .await?
            .into_iter()
            .filter(|t| t.usage_count > 0 && !is_predefined(&t.name))
            .map(|t| t.name)
            .collect();

        Ok(PREDEFINED_TAGS
            .iter()
            .map(|t| t.to_string())
            .chain(custom)
            .collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(filter_matching(query, &self.all_tags().await?))
    }
}
