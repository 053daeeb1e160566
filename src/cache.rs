//! URL-keyed metadata cache
//!
//! Owned by the orchestrating layer, not the retriever: the core stays
//! stateless between calls. Entries have no expiry; eviction is the
//! owner's decision.

use crate::extractor::models::VideoInfo;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<String, VideoInfo>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&VideoInfo> {
        self.entries.get(url)
    }

    pub fn put(&mut self, url: impl Into<String>, info: VideoInfo) {
        self.entries.insert(url.into(), info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
