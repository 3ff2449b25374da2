use std::collections::HashMap;

use crate::config::Configuration;
use crate::error::{ClassifierError, Result};
use crate::models::classifier_trait::ClassifierGenerator;
use crate::models::gbdt::GbdtGenerator;
use crate::models::onevsall_generator::OneVsAllGenerator;
use crate::models::prior::PriorGenerator;
use crate::models::stump::StumpGenerator;

/// Builds a generator with default settings.
pub type GeneratorFactory = fn() -> Box<dyn ClassifierGenerator>;

/// Name to factory table used to build generators from configuration.
///
/// Build one at startup (usually with [`GeneratorRegistry::builtin`]), add any
/// custom generators, then share it read-only.
#[derive(Default)]
pub struct GeneratorRegistry {
    factories: HashMap<String, GeneratorFactory>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every generator shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, GeneratorFactory); 4] = [
            ("onevsall", || -> Box<dyn ClassifierGenerator> {
                Box::new(OneVsAllGenerator::new())
            }),
            ("gbdt", || -> Box<dyn ClassifierGenerator> {
                Box::new(GbdtGenerator::default())
            }),
            ("stump", || -> Box<dyn ClassifierGenerator> {
                Box::new(StumpGenerator::default())
            }),
            ("prior", || -> Box<dyn ClassifierGenerator> {
                Box::new(PriorGenerator::default())
            }),
        ];
        for (name, factory) in builtins {
            registry.factories.insert(name.to_string(), factory);
        }
        registry
    }

    pub fn register(&mut self, name: &str, factory: GeneratorFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(ClassifierError::DuplicateGenerator(name.to_string()));
        }
        log::debug!("Registered generator '{}'", name);
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A defaulted, unconfigured generator.
    pub fn create(&self, name: &str) -> Result<Box<dyn ClassifierGenerator>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ClassifierError::UnknownGenerator(name.to_string()))?;
        Ok(factory())
    }

    /// Build and configure the generator described by a configuration block.
    pub fn from_config(
        &self,
        config: &Configuration,
        unparsed: &mut Vec<String>,
    ) -> Result<Box<dyn ClassifierGenerator>> {
        let type_name = config.type_name()?.ok_or_else(|| {
            ClassifierError::Config(format!(
                "block `{}` does not name a generator `type`",
                config.path()
            ))
        })?;
        let mut generator = self.create(&type_name)?;
        generator.configure(config, self, unparsed)?;
        Ok(generator)
    }

    /// Build the generator configured in sub-block `key` of `config`.
    pub fn get_trainer(
        &self,
        key: &str,
        config: &Configuration,
        unparsed: &mut Vec<String>,
    ) -> Result<Box<dyn ClassifierGenerator>> {
        let block = config.subconfig(key)?.ok_or_else(|| {
            ClassifierError::Config(format!("missing `{}` sub-configuration", key))
        })?;
        self.from_config(&block, unparsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_every_generator() {
        let registry = GeneratorRegistry::builtin();
        assert_eq!(registry.names(), vec!["gbdt", "onevsall", "prior", "stump"]);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = GeneratorRegistry::builtin();
        let err = registry
            .register("stump", || -> Box<dyn ClassifierGenerator> {
                Box::new(StumpGenerator::default())
            })
            .unwrap_err();
        assert!(matches!(err, ClassifierError::DuplicateGenerator(name) if name == "stump"));
    }

    #[test]
    fn create_unknown_name_fails() {
        let registry = GeneratorRegistry::builtin();
        assert!(matches!(
            registry.create("svm"),
            Err(ClassifierError::UnknownGenerator(_))
        ));
    }

    #[test]
    fn from_config_requires_type() {
        let registry = GeneratorRegistry::builtin();
        let config = Configuration::from_json_str(r#"{"verbosity": 1}"#).unwrap();
        let mut unparsed = Vec::new();
        assert!(matches!(
            registry.from_config(&config, &mut unparsed),
            Err(ClassifierError::Config(_))
        ));
    }
}
