use log::*;
use semver::Version;
use std::collections::BTreeMap;
use toml_edit::{DocumentMut, Item, value};

use crate::Result;

const DEPENDENCY_TABLES: [&str; 3] =
    ["dependencies", "dev-dependencies", "build-dependencies"];

/// Updates the package version in `Cargo.toml` along with path dependencies
/// on sibling crates released in the same run.
#[derive(Debug, Clone)]
pub struct CargoTomlUpdater {
    version: Version,
    /// Crate name → next version of sibling crates
    dependencies: BTreeMap<String, Version>,
}

impl CargoTomlUpdater {
    pub fn new(
        version: &Version,
        dependencies: BTreeMap<String, Version>,
    ) -> Self {
        Self {
            version: version.clone(),
            dependencies,
        }
    }

    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        let Some(old) = old else {
            return Ok(None);
        };

        let mut doc = old.parse::<DocumentMut>()?;

        let Some(package) =
            doc.get_mut("package").and_then(Item::as_table_like_mut)
        else {
            debug!("Cargo.toml has no [package] table: skipping");
            return Ok(None);
        };

        // version.workspace = true is owned by the workspace root
        if package.get("version").is_some_and(|v| !v.is_str()) {
            debug!("Cargo.toml inherits its version: skipping");
            return Ok(None);
        }

        package.insert("version", value(self.version.to_string()));

        for table in DEPENDENCY_TABLES {
            self.update_dependencies(&mut doc, table);
        }

        Ok(Some(doc.to_string()))
    }

    fn update_dependencies(&self, doc: &mut DocumentMut, table: &str) {
        let Some(deps) = doc.get_mut(table).and_then(Item::as_table_like_mut)
        else {
            return;
        };

        for (name, version) in self.dependencies.iter() {
            let Some(dep) = deps.get_mut(name) else {
                continue;
            };

            let next = version.to_string();

            if dep.is_str() {
                *dep = value(next);
            } else if let Some(dep) = dep.as_table_like_mut()
                && dep.contains_key("version")
            {
                dep.insert("version", value(next));
            }
        }
    }
}
