//! Filter catalog loaded from a JSON configuration file.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// One filter available to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub id: String,
    pub title: String,
    /// Whether the underlying attribute holds a list of values.
    #[serde(default)]
    pub multi_valued: bool,
}

/// The set of filter definitions available to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCatalog {
    filters: Vec<FilterDefinition>,
}

impl FilterCatalog {
    /// Load the catalog from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "configuration file not found: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!(
                "cannot read configuration file {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        let catalog: FilterCatalog = serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "cannot parse configuration file {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&FilterDefinition> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn filters(&self) -> &[FilterDefinition] {
        &self.filters
    }
}

impl Default for FilterCatalog {
    /// The built-in catalog covering the known work item attributes.
    fn default() -> Self {
        let definition = |id: &str, title: &str, multi_valued: bool| FilterDefinition {
            id: id.to_string(),
            title: title.to_string(),
            multi_valued,
        };
        Self {
            filters: vec![
                definition("assignee", "Assignee", true),
                definition("area", "Area", false),
                definition("workitemtype", "Type", false),
                definition("iteration", "Iteration", false),
            ],
        }
    }
}
