use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseParseError {
    #[error("output is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("output must be a YAML mapping")]
    NotAMapping,

    #[error("'{0}' must be a mapping")]
    FieldNotAMapping(&'static str),

    #[error("'{field}.{key}' must be a scalar value")]
    NonScalar { field: &'static str, key: String },
}

/// Parsed output of a buildpack's `release` phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseMetadata {
    default_process_types: Vec<(String, String)>,
    config_vars: Vec<(String, String)>,
}

impl ReleaseMetadata {
    pub fn parse(output: &str) -> Result<Self, ReleaseParseError> {
        let value: Value = serde_yaml::from_str(output)?;
        let Value::Mapping(mapping) = value else {
            return Err(ReleaseParseError::NotAMapping);
        };

        Ok(Self {
            default_process_types: string_pairs(&mapping, "default_process_types")?,
            config_vars: string_pairs(&mapping, "config_vars")?,
        })
    }

    pub fn default_process_types(&self) -> &[(String, String)] {
        &self.default_process_types
    }

    /// Environment the buildpack wants the app launched with, in release order
    pub fn config_vars(&self) -> &[(String, String)] {
        &self.config_vars
    }

    pub fn process_type(&self, name: &str) -> Option<&str> {
        self.default_process_types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, command)| command.as_str())
    }

    pub fn web(&self) -> Option<&str> {
        self.process_type("web")
    }
}

fn string_pairs(
    mapping: &Mapping,
    field: &'static str,
) -> Result<Vec<(String, String)>, ReleaseParseError> {
    let section = match mapping.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Mapping(section)) => section,
        Some(_) => return Err(ReleaseParseError::FieldNotAMapping(field)),
    };

    section
        .iter()
        .map(|(key, value)| {
            let key = scalar(key).ok_or_else(|| ReleaseParseError::NonScalar {
                field,
                key: format!("{:?}", key),
            })?;
            let value = scalar(value).ok_or_else(|| ReleaseParseError::NonScalar {
                field,
                key: key.clone(),
            })?;
            Ok((key, value))
        })
        .collect()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
