//! Model of the `Bootstrapp.json` template spec.
//!
//! The spec declares substitutions, user-facing parameters, package
//! records, inclusion rules, and which files get their contents rendered.
//! Unknown keys are ignored.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SpecError;
use crate::template::Value;

/// Name of the spec file inside a template bundle.
pub const SPEC_FILE_NAME: &str = "Bootstrapp.json";

/// Name of the placeholder file used to keep otherwise-empty directories
/// in version control; never copied to the output.
pub const PLACEHOLDER_FILE_NAME: &str = ".ignored-placeholder";

/// A parsed template spec.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrappSpec {
    #[serde(default = "default_template_version")]
    pub template_version: String,

    /// Flat map merged verbatim into the context.
    #[serde(default)]
    pub substitutions: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Package records, filtered by name before they reach the context.
    #[serde(default)]
    pub packages: Vec<serde_json::Value>,

    /// Template expression producing the output directory name.
    #[serde(default)]
    pub output_directory_name: String,

    #[serde(default)]
    pub include_directories: Vec<IncludeRule>,

    #[serde(default)]
    pub include_files: Vec<IncludeRule>,

    /// Regex patterns matched (anchored) against rendered basenames.
    #[serde(default)]
    pub parametrizable_files: Vec<String>,

    /// Opaque tag consumed by external tooling.
    #[serde(default, rename = "type")]
    pub template_type: Option<String>,
}

fn default_template_version() -> String {
    "1.0.0".to_string()
}

/// A conditional inclusion rule: when `condition` evaluates false, the
/// listed paths are blacklisted.
#[derive(Debug, Clone, Deserialize)]
pub struct IncludeRule {
    #[serde(rename = "if")]
    pub condition: String,

    #[serde(default)]
    pub directories: Vec<String>,

    #[serde(default)]
    pub files: Vec<String>,
}

/// A user-facing template parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ParameterKind,

    #[serde(default)]
    pub default: Option<serde_json::Value>,

    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ParameterKind {
    String,
    Bool,
    Option,
}

impl BootstrappSpec {
    /// Loads and parses the spec file from a template bundle directory.
    pub fn load(template_dir: &Path) -> Result<Self, SpecError> {
        let path = template_dir.join(SPEC_FILE_NAME);
        if !path.exists() {
            return Err(SpecError::Missing(path));
        }
        let text = fs::read_to_string(&path).map_err(|e| SpecError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|source| SpecError::Malformed { path, source })
    }

    /// Package records whose `name` is not in the exclusion set.
    pub fn retained_packages(&self, excluded: &[String]) -> Vec<&serde_json::Value> {
        self.packages
            .iter()
            .filter(|package| {
                package
                    .get("name")
                    .and_then(|name| name.as_str())
                    .map_or(true, |name| !excluded.iter().any(|e| e == name))
            })
            .collect()
    }
}

impl Parameter {
    /// Resolves this parameter to a context value.
    ///
    /// A user-supplied value always wins; it is coerced to bool for `Bool`
    /// parameters (`"true"`/`"false"`, case-insensitive). Otherwise the
    /// declared default applies: `String` falls back to null when empty or
    /// absent, `Bool` to false, and `Option` picks `options[default]` or
    /// null when no default index is given.
    pub fn resolve(&self, supplied: Option<&str>) -> Result<Value, SpecError> {
        if let Some(raw) = supplied {
            return Ok(match self.kind {
                ParameterKind::Bool => Value::Bool(raw.eq_ignore_ascii_case("true")),
                _ => Value::String(raw.to_string()),
            });
        }

        match self.kind {
            ParameterKind::String => Ok(match self.default.as_ref().and_then(|d| d.as_str()) {
                Some(s) if !s.is_empty() => Value::String(s.to_string()),
                _ => Value::Null,
            }),
            ParameterKind::Bool => {
                let default = self.default.as_ref().map_or(false, |d| {
                    d.as_bool().unwrap_or_else(|| {
                        d.as_str().is_some_and(|s| s.eq_ignore_ascii_case("true"))
                    })
                });
                Ok(Value::Bool(default))
            }
            ParameterKind::Option => match self.default.as_ref().and_then(|d| d.as_u64()) {
                Some(index) => {
                    let index = index as usize;
                    match self.options.get(index) {
                        Some(option) => Ok(Value::String(option.clone())),
                        None => Err(SpecError::OptionOutOfRange {
                            id: self.id.clone(),
                            index,
                            count: self.options.len(),
                        }),
                    }
                }
                None => Ok(Value::Null),
            },
        }
    }

    /// Resolves every parameter into `context`, with `supplied` holding the
    /// user-provided raw values keyed by parameter id.
    pub fn resolve_all(
        parameters: &[Parameter],
        supplied: &HashMap<String, String>,
        context: &mut crate::template::Context,
    ) -> Result<(), SpecError> {
        for parameter in parameters {
            let value = parameter.resolve(supplied.get(&parameter.id).map(String::as_str))?;
            context.set(&parameter.id, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameter(json: &str) -> Parameter {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_spec_defaults_and_unknown_keys() {
        let spec: BootstrappSpec = serde_json::from_str(
            r#"{"outputDirectoryName": "<{ name }>", "somethingElse": 1}"#,
        )
        .unwrap();
        assert_eq!(spec.template_version, "1.0.0");
        assert!(spec.parameters.is_empty());
        assert!(spec.parametrizable_files.is_empty());
        assert_eq!(spec.output_directory_name, "<{ name }>");
    }

    #[test]
    fn test_user_supplied_values_win() {
        let p = parameter(r#"{"id": "name", "type": "String", "default": "x"}"#);
        assert_eq!(
            p.resolve(Some("given")).unwrap(),
            Value::String("given".into())
        );

        let p = parameter(r#"{"id": "on", "type": "Bool"}"#);
        assert_eq!(p.resolve(Some("TRUE")).unwrap(), Value::Bool(true));
        assert_eq!(p.resolve(Some("false")).unwrap(), Value::Bool(false));
        assert_eq!(p.resolve(Some("junk")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_string_defaults() {
        let p = parameter(r#"{"id": "name", "type": "String", "default": "app"}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::String("app".into()));

        let p = parameter(r#"{"id": "name", "type": "String", "default": ""}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Null);

        let p = parameter(r#"{"id": "name", "type": "String"}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_bool_defaults() {
        let p = parameter(r#"{"id": "on", "type": "Bool", "default": true}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Bool(true));

        let p = parameter(r#"{"id": "on", "type": "Bool", "default": "True"}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Bool(true));

        let p = parameter(r#"{"id": "on", "type": "Bool"}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_option_picks_default_index() {
        let p = parameter(
            r#"{"id": "mode", "type": "Option", "options": ["dev", "prod"], "default": 1}"#,
        );
        assert_eq!(p.resolve(None).unwrap(), Value::String("prod".into()));

        let p = parameter(r#"{"id": "mode", "type": "Option", "options": ["dev"]}"#);
        assert_eq!(p.resolve(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_option_out_of_range_is_an_error() {
        let p = parameter(
            r#"{"id": "mode", "type": "Option", "options": ["dev"], "default": 3}"#,
        );
        assert!(matches!(
            p.resolve(None),
            Err(SpecError::OptionOutOfRange { index: 3, count: 1, .. })
        ));
    }

    #[test]
    fn test_retained_packages() {
        let spec: BootstrappSpec = serde_json::from_str(
            r#"{"packages": [{"name": "core"}, {"name": "extras"}, {"url": "anonymous"}]}"#,
        )
        .unwrap();
        let retained = spec.retained_packages(&["extras".to_string()]);
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0]["name"], "core");
    }
}
