//! Explicit field-name mapping files
//!
//! A mapping file aligns flattened full-struct field names with the view's
//! naming, e.g. when the view renames `totalmass` to `total`:
//!
//! ```yaml
//! # source path -> output name
//! totalmass: total
//! mainFull.density: mainFull_rho
//! ```
//!
//! Keys are matched against the dot path of a field (array indices stripped)
//! or against the bare field name; the value replaces the whole accumulated
//! output prefix.

use crate::error::CastResult;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: HashMap<String, String>,
}

impl Mapping {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Load a mapping file. An empty or comment-only file yields an empty map.
    pub fn load(path: &Path) -> CastResult<Self> {
        let content = std::fs::read_to_string(path)?;
        // A comment-only file deserializes as null
        let entries: Option<HashMap<String, String>> = serde_yaml::from_str(&content)?;
        Ok(Self {
            entries: entries.unwrap_or_default(),
        })
    }

    pub fn insert(&mut self, source: impl Into<String>, output: impl Into<String>) {
        self.entries.insert(source.into(), output.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_mapping() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# align with view naming").unwrap();
        writeln!(file, "totalmass: total").unwrap();
        writeln!(file, "mainFull.density: mainFull_rho").unwrap();

        let mapping = Mapping::load(file.path()).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("totalmass"), Some("total"));
        assert_eq!(mapping.get("mainFull.density"), Some("mainFull_rho"));
        assert_eq!(mapping.get("missing"), None);
    }

    #[test]
    fn test_load_empty_mapping() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing mapped yet").unwrap();

        let mapping = Mapping::load(file.path()).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Mapping::load(Path::new("no-such-mapping.yaml"));
        assert!(result.is_err());
    }
}
