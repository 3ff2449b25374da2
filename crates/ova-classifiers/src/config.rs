use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClassifierError, Result};

/// Key naming the generator type inside a configuration block.
pub const TYPE_KEY: &str = "type";

/// Hierarchical key/value configuration.
///
/// Each block is a JSON object; nested objects are sub-configurations. A
/// block that builds a generator names it under `"type"`, e.g.
///
/// ```json
/// { "type": "onevsall", "verbosity": 1,
///   "weak_learner": { "type": "stump" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: Map<String, Value>,
    path: String,
}

impl Configuration {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self {
                values,
                path: String::new(),
            }),
            other => Err(ClassifierError::Config(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|source| {
            ClassifierError::ConfigValue {
                key: "<root>".to_string(),
                source,
            }
        })?;
        Self::from_value(value)
    }

    /// Dotted path of this block from the root, empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn qualified(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Deserialize `key` if present.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ClassifierError::ConfigValue {
                    key: self.qualified(key),
                    source,
                }),
        }
    }

    /// Overwrite `var` with `key` when present; returns whether it was found.
    pub fn find<T: DeserializeOwned>(&self, var: &mut T, key: &str) -> Result<bool> {
        match self.get(key)? {
            Some(value) => {
                *var = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn subconfig(&self, key: &str) -> Result<Option<Configuration>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Object(values)) => Ok(Some(Configuration {
                values: values.clone(),
                path: self.qualified(key),
            })),
            Some(other) => Err(ClassifierError::Config(format!(
                "`{}` must be a sub-configuration block, got {}",
                self.qualified(key),
                other
            ))),
        }
    }

    pub fn type_name(&self) -> Result<Option<String>> {
        self.get(TYPE_KEY)
    }

    /// Deserialize the whole block into a parameter struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|source| {
            ClassifierError::ConfigValue {
                key: if self.path.is_empty() {
                    "<root>".to_string()
                } else {
                    self.path.clone()
                },
                source,
            }
        })
    }

    /// Keys in this block that `options` does not describe, fully qualified.
    pub fn unrecognized_keys(&self, options: &ConfigOptions) -> Vec<String> {
        self.keys()
            .filter(|key| *key != TYPE_KEY && !options.contains(key))
            .map(|key| self.qualified(key))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    Integer,
    Float,
    Boolean,
    String,
    /// Nested block; carries the nested generator's options when one is bound.
    Subconfig(Option<ConfigOptions>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOption {
    pub name: String,
    pub kind: OptionKind,
    pub default: Option<String>,
    pub description: String,
}

/// Description of the keys a generator understands, for help output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOptions {
    options: Vec<ConfigOption>,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        mut self,
        name: &str,
        kind: OptionKind,
        default: impl fmt::Display,
        description: &str,
    ) -> Self {
        self.options.push(ConfigOption {
            name: name.to_string(),
            kind,
            default: Some(default.to_string()),
            description: description.to_string(),
        });
        self
    }

    pub fn subconfig(mut self, name: &str, nested: Option<ConfigOptions>, description: &str) -> Self {
        self.options.push(ConfigOption {
            name: name.to_string(),
            kind: OptionKind::Subconfig(nested),
            default: None,
            description: description.to_string(),
        });
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.iter()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        for option in &self.options {
            let kind = match &option.kind {
                OptionKind::Integer => "int",
                OptionKind::Float => "float",
                OptionKind::Boolean => "bool",
                OptionKind::String => "string",
                OptionKind::Subconfig(_) => "block",
            };
            match &option.default {
                Some(default) => writeln!(
                    f,
                    "{}{} <{}> = {}: {}",
                    pad, option.name, kind, default, option.description
                )?,
                None => writeln!(f, "{}{} <{}>: {}", pad, option.name, kind, option.description)?,
            }
            if let OptionKind::Subconfig(Some(nested)) = &option.kind {
                nested.write_indented(f, depth + 1)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Hyper-parameters of the gradient boosted tree weak learner.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GbdtParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub num_boost_round: u32,
    pub debug: bool,
    pub training_optimization_level: u8,
    pub loss_type: String,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 6,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }
}

/// Hyper-parameters of the decision stump weak learner.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StumpParams {
    /// Fraction of candidate features searched per training call, in (0, 1].
    pub feature_fraction: f32,
}

impl Default for StumpParams {
    fn default() -> Self {
        Self {
            feature_fraction: 1.0,
        }
    }
}

impl StumpParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(ClassifierError::Config(format!(
                "feature_fraction must be in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_leaves_default_when_missing() {
        let config = Configuration::from_json_str(r#"{"verbosity": 3}"#).unwrap();
        let mut verbosity = 0u32;
        let mut other = 7u32;
        assert!(config.find(&mut verbosity, "verbosity").unwrap());
        assert!(!config.find(&mut other, "missing").unwrap());
        assert_eq!((verbosity, other), (3, 7));
    }

    #[test]
    fn find_reports_qualified_key_on_bad_value() {
        let config =
            Configuration::from_json_str(r#"{"weak_learner": {"verbosity": "loud"}}"#).unwrap();
        let sub = config.subconfig("weak_learner").unwrap().unwrap();
        let mut verbosity = 0u32;
        match sub.find(&mut verbosity, "verbosity") {
            Err(ClassifierError::ConfigValue { key, .. }) => {
                assert_eq!(key, "weak_learner.verbosity")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn subconfig_must_be_object() {
        let config = Configuration::from_json_str(r#"{"weak_learner": "stump"}"#).unwrap();
        assert!(matches!(
            config.subconfig("weak_learner"),
            Err(ClassifierError::Config(_))
        ));
    }

    #[test]
    fn unrecognized_keys_skip_type() {
        let config =
            Configuration::from_json_str(r#"{"type": "prior", "verbosity": 1, "colour": "red"}"#)
                .unwrap();
        let options = ConfigOptions::new().add("verbosity", OptionKind::Integer, 0, "");
        assert_eq!(config.unrecognized_keys(&options), vec!["colour".to_string()]);
    }

    #[test]
    fn gbdt_params_fill_missing_fields_from_defaults() {
        let config = Configuration::from_json_str(
            r#"{"type": "gbdt", "max_depth": 3, "num_boost_round": 5}"#,
        )
        .unwrap();
        let params: GbdtParams = config.deserialize().unwrap();
        assert_eq!(params.max_depth, 3);
        assert_eq!(params.num_boost_round, 5);
        assert_eq!(params.loss_type, "LogLikelyhood");
    }

    #[test]
    fn help_text_nests_subconfig_options() {
        let nested = ConfigOptions::new().add("max_depth", OptionKind::Integer, 6, "tree depth");
        let options = ConfigOptions::new()
            .add("verbosity", OptionKind::Integer, 0, "progress output")
            .subconfig("weak_learner", Some(nested), "binary learner");
        let text = options.to_string();
        assert!(text.contains("weak_learner <block>: binary learner"));
        assert!(text.contains("  max_depth <int> = 6: tree depth"));
    }
}
