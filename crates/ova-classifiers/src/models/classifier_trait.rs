use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigOptions, Configuration, OptionKind};
use crate::context::TrainContext;
use crate::data_handling::TrainingData;
use crate::error::{ClassifierError, Result};
use crate::feature_space::{Feature, FeatureSpace};
use crate::models::factory::GeneratorRegistry;

/// A trained model.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Number of label values `predict` scores.
    fn label_count(&self) -> usize;

    /// Score every label value for one example. `row` is a full example laid
    /// out like the training data, predicted feature included; a shorter row
    /// is a caller bug and may panic.
    fn predict(&self, row: &[f32]) -> Vec<f32>;

    fn name(&self) -> &str {
        "classifier"
    }
}

/// Something that trains classifiers: a weak learner, or a reduction built
/// on top of one.
///
/// Lifecycle: `configure` (or direct construction), then `init` against a
/// feature space and target, then any number of `generate` calls. `init` may
/// be called again to retarget the generator.
pub trait ClassifierGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Read recognised keys from `config`; keys this generator does not know
    /// are appended to `unparsed`.
    fn configure(
        &mut self,
        config: &Configuration,
        registry: &GeneratorRegistry,
        unparsed: &mut Vec<String>,
    ) -> Result<()>;

    fn defaults(&mut self);

    fn options(&self) -> ConfigOptions;

    fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()>;

    fn generate(
        &self,
        context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        features: &[Feature],
    ) -> Result<Box<dyn Classifier>>;
}

/// State every generator carries: verbosity and the bound target.
#[derive(Debug, Clone, Default)]
pub struct GeneratorBase {
    pub verbosity: u32,
    feature_space: Option<Arc<FeatureSpace>>,
    predicted: Option<Feature>,
}

impl GeneratorBase {
    pub fn configure(&mut self, config: &Configuration) -> Result<()> {
        config.find(&mut self.verbosity, "verbosity")?;
        Ok(())
    }

    pub fn defaults(&mut self) {
        self.verbosity = 0;
    }

    pub fn options(&self) -> ConfigOptions {
        ConfigOptions::new().add(
            "verbosity",
            OptionKind::Integer,
            self.verbosity,
            "progress output level; 0 is silent",
        )
    }

    pub fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()> {
        feature_space.info(predicted)?;
        self.feature_space = Some(feature_space);
        self.predicted = Some(predicted);
        Ok(())
    }

    /// The bound feature space and target, or `NotInitialized`.
    pub fn bound(&self, generator: &str) -> Result<(&Arc<FeatureSpace>, Feature)> {
        match (&self.feature_space, self.predicted) {
            (Some(fs), Some(predicted)) => Ok((fs, predicted)),
            _ => Err(ClassifierError::NotInitialized {
                generator: generator.to_string(),
            }),
        }
    }
}

/// Shared argument checks for weak learners.
pub(crate) fn check_training_inputs(data: &TrainingData, weights: &[f32]) -> Result<()> {
    if data.example_count() == 0 {
        return Err(ClassifierError::EmptyTrainingData);
    }
    if weights.len() != data.example_count() {
        return Err(ClassifierError::WeightLengthMismatch {
            weights: weights.len(),
            examples: data.example_count(),
        });
    }
    Ok(())
}

/// Candidate features minus the target itself.
pub(crate) fn usable_features(features: &[Feature], predicted: Feature) -> Result<Vec<Feature>> {
    let usable: Vec<Feature> = features.iter().copied().filter(|&f| f != predicted).collect();
    if usable.is_empty() {
        return Err(ClassifierError::NoCandidateFeatures);
    }
    Ok(usable)
}
