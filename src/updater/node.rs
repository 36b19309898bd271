use log::*;
use semver::Version;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::Result;

const DEPENDENCY_TABLES: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Node manifest files handled by [`NodeUpdater`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFile {
    PackageJson,
    PackageLock,
}

/// Updates `package.json` and `package-lock.json` versions. Dependencies on
/// other packages released in the same run are bumped too, keeping their
/// range prefix.
#[derive(Debug, Clone)]
pub struct NodeUpdater {
    file: NodeFile,
    version: Version,
    /// Package name → next version of sibling packages
    dependencies: BTreeMap<String, Version>,
}

impl NodeUpdater {
    pub fn new(
        file: NodeFile,
        version: &Version,
        dependencies: BTreeMap<String, Version>,
    ) -> Self {
        Self {
            file,
            version: version.clone(),
            dependencies,
        }
    }

    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        let Some(old) = old else {
            return Ok(None);
        };

        let mut doc: Value = serde_json::from_str(old)?;
        let next = self.version.to_string();

        match self.file {
            NodeFile::PackageJson => {
                doc["version"] = json!(next);
                self.update_dependencies(&mut doc);
            }
            NodeFile::PackageLock => {
                doc["version"] = json!(next);
                if let Some(root) = doc
                    .get_mut("packages")
                    .and_then(|p| p.get_mut(""))
                    .and_then(|p| p.as_object_mut())
                {
                    root.insert("version".into(), json!(next));
                }
            }
        }

        let formatted = serde_json::to_string_pretty(&doc)?;
        Ok(Some(format!("{formatted}\n")))
    }

    fn update_dependencies(&self, doc: &mut Value) {
        for table in DEPENDENCY_TABLES {
            let Some(deps) = doc.get_mut(table).and_then(|d| d.as_object_mut())
            else {
                continue;
            };

            for (name, version) in self.dependencies.iter() {
                let Some(current) = deps.get(name).and_then(|v| v.as_str())
                else {
                    continue;
                };

                // workspace:*, file:, git urls etc. are left alone
                let prefix = match current.chars().next() {
                    Some('^') => "^",
                    Some('~') => "~",
                    Some(c) if c.is_ascii_digit() => "",
                    _ => {
                        debug!("leaving {table}.{name} = {current}");
                        continue;
                    }
                };

                deps.insert(name.clone(), json!(format!("{prefix}{version}")));
            }
        }
    }
}
