use log::*;
use semver::Version;
use toml_edit::{DocumentMut, Item, value};

use crate::Result;

/// Updates the version in `pyproject.toml`: `[project]` (PEP 621) first,
/// falling back to `[tool.poetry]`.
#[derive(Debug, Clone)]
pub struct PyProjectUpdater {
    version: Version,
}

impl PyProjectUpdater {
    pub fn new(version: &Version) -> Self {
        Self {
            version: version.clone(),
        }
    }

    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        let Some(old) = old else {
            return Ok(None);
        };

        let mut doc = old.parse::<DocumentMut>()?;
        let next = self.version.to_string();

        if let Some(project) =
            doc.get_mut("project").and_then(Item::as_table_like_mut)
            && project.contains_key("version")
        {
            project.insert("version", value(next));
            return Ok(Some(doc.to_string()));
        }

        if let Some(poetry) = doc
            .get_mut("tool")
            .and_then(|tool| tool.get_mut("poetry"))
            .and_then(Item::as_table_like_mut)
            && poetry.contains_key("version")
        {
            poetry.insert("version", value(next));
            return Ok(Some(doc.to_string()));
        }

        warn!("pyproject.toml has no static version: skipping");
        Ok(None)
    }
}
