//! Tag Index Module
//!
//! Maps tags to the hashed keys of the entries carrying them.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Secondary index from tag to the set of entry hashes tagged with it.
///
/// Tags whose set becomes empty are dropped, so `len` counts only tags that
/// still reference at least one entry.
#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<u64>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `hash` under every tag in `tags`.
    pub fn link(&mut self, hash: u64, tags: &[String]) {
        for tag in tags {
            self.by_tag.entry(tag.clone()).or_default().insert(hash);
        }
    }

    /// Removes the links from each tag in `tags` to `hash`.
    pub fn unlink(&mut self, hash: u64, tags: &[String]) {
        for tag in tags {
            if let Some(hashes) = self.by_tag.get_mut(tag) {
                hashes.remove(&hash);
                if hashes.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Removes `tag` and returns the hashes it referenced.
    pub fn take(&mut self, tag: &str) -> HashSet<u64> {
        self.by_tag.remove(tag).unwrap_or_default()
    }

    /// Number of entries currently linked under `tag`.
    pub fn tagged_len(&self, tag: &str) -> usize {
        self.by_tag.get(tag).map_or(0, HashSet::len)
    }

    /// Iterates over `(tag, hashes)` pairs.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<u64>)> {
        self.by_tag.iter()
    }

    /// Number of tags in the index.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_tag.clear();
    }
}
