use crate::{Result, analyzer::changelog::prepend_entry};

/// Prepends a rendered entry to a changelog, creating it when missing
#[derive(Debug, Clone)]
pub struct ChangelogUpdater {
    entry: String,
}

impl ChangelogUpdater {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
        }
    }

    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        // already prepended by an earlier run of the same release
        if let Some(old) = old
            && old.contains(self.entry.trim())
        {
            return Ok(Some(old.to_string()));
        }

        Ok(Some(prepend_entry(old, &self.entry)))
    }
}
