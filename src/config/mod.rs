use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file settings,
/// e.g. `TAGQUERY_LIMITS__SERIES=500`.
pub const ENV_PREFIX: &str = "TAGQUERY";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    pub fields: FieldNames,
    pub limits: Limits,
}

impl IndexConfig {
    /// Layer an optional config file and `TAGQUERY_*` environment variables
    /// over the built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Config: Failed to read index configuration")?;

        settings
            .try_deserialize()
            .context("Config: Invalid index configuration")
    }
}

/// Names of the reserved index fields.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub metric: String,
    pub nid: String,
    pub endpoint: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            metric: "__name__".to_string(),
            nid: "__nid__".to_string(),
            endpoint: "__endpoint__".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    pub series: usize,
    pub docs: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            series: 1000,
            docs: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = IndexConfig::load(None).unwrap();
        assert_eq!(config.fields.metric, "__name__");
        assert_eq!(config.fields.nid, "__nid__");
        assert_eq!(config.fields.endpoint, "__endpoint__");
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "fields:\n  endpoint: ident\nlimits:\n  docs: 5").unwrap();

        let config = IndexConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.fields.endpoint, "ident");
        assert_eq!(config.fields.metric, "__name__");
        assert_eq!(config.limits.docs, 5);
        assert_eq!(config.limits.series, 1000);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = IndexConfig::load(Some(Path::new("/nonexistent/tagquery.yaml"))).unwrap_err();
        assert!(err.to_string().starts_with("Config:"));
    }
}
