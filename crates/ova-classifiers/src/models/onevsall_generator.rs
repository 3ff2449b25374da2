//! One-vs-all reduction: trains one binary weak learner per label value.
//!
//! The generator keeps a single derived copy of the training data whose
//! predicted feature is re-declared boolean. For each label `v`, in order,
//! that column is overwritten with "is `v` in this example's label
//! combination", the weak learner is re-initialised on the derived feature
//! space and trained, and its model becomes entry `v` of the ensemble.
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{ConfigOptions, Configuration};
use crate::context::TrainContext;
use crate::data_handling::{LabelCombinations, TrainingData};
use crate::error::{ClassifierError, Result};
use crate::feature_space::{Feature, FeatureKind, FeatureSpace};
use crate::models::classifier_trait::{Classifier, ClassifierGenerator, GeneratorBase};
use crate::models::factory::GeneratorRegistry;
use crate::models::onevsall::OneVsAllClassifier;

const WEAK_LEARNER_KEY: &str = "weak_learner";

#[derive(Default)]
pub struct OneVsAllGenerator {
    base: GeneratorBase,
    // Locked for a whole `generate` call: label iterations re-init and train
    // the same learner against one shared derived buffer.
    weak_learner: Option<Mutex<Box<dyn ClassifierGenerator>>>,
    labels: Option<LabelCombinations>,
    template: Option<OneVsAllClassifier>,
}

impl OneVsAllGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weak_learner(mut self, learner: Box<dyn ClassifierGenerator>) -> Self {
        self.set_weak_learner(learner);
        self
    }

    pub fn set_weak_learner(&mut self, learner: Box<dyn ClassifierGenerator>) {
        self.weak_learner = Some(Mutex::new(learner));
    }

    pub fn has_weak_learner(&self) -> bool {
        self.weak_learner.is_some()
    }

    /// Label combination list and label count used by the next `generate`.
    pub fn set_labels(&mut self, labels: LabelCombinations) {
        self.labels = Some(labels);
    }

    pub fn with_labels(mut self, labels: LabelCombinations) -> Self {
        self.set_labels(labels);
        self
    }

    pub fn labels(&self) -> Option<&LabelCombinations> {
        self.labels.as_ref()
    }

    pub fn verbosity(&self) -> u32 {
        self.base.verbosity
    }

    fn lock_learner(&self) -> Result<MutexGuard<'_, Box<dyn ClassifierGenerator>>> {
        let learner = self.weak_learner.as_ref().ok_or(ClassifierError::NoWeakLearner)?;
        // A panic inside a previous training call leaves no state we rely on:
        // the learner is re-initialised before every label.
        Ok(learner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Combination index of every example, validated before any training.
    fn resolve_targets(
        labels: &LabelCombinations,
        data: &TrainingData,
        predicted: Feature,
    ) -> Result<Vec<usize>> {
        (0..data.example_count())
            .map(|i| labels.resolve(i, data[(i, predicted)]))
            .collect()
    }

    /// Train and return the populated ensemble.
    pub fn train(
        &self,
        context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        features: &[Feature],
    ) -> Result<OneVsAllClassifier> {
        let (feature_space, predicted) = self.base.bound(self.name())?;
        if data.feature_space().len() != feature_space.len() {
            return Err(ClassifierError::FeatureSpaceMismatch {
                expected: feature_space.len(),
                got: data.feature_space().len(),
            });
        }
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| ClassifierError::NotInitialized {
                generator: self.name().to_string(),
            })?;
        let labels = match &self.labels {
            Some(labels) if labels.num_labels() > 0 => labels,
            _ => return Err(ClassifierError::NoLabels),
        };
        let mut learner = self.lock_learner()?;

        if weights.len() != data.example_count() {
            return Err(ClassifierError::WeightLengthMismatch {
                weights: weights.len(),
                examples: data.example_count(),
            });
        }
        let combination_of = Self::resolve_targets(labels, data, predicted)?;

        let mut current = template.clone();

        let boolean_space = feature_space.with_kind(predicted, FeatureKind::Boolean)?;
        let mut binary_data = data.make_copy();
        binary_data.set_feature_space(Arc::clone(&boolean_space))?;

        let num_labels = labels.num_labels();
        if self.base.verbosity > 0 {
            log::info!("{} unique labels", num_labels);
        }

        for label in 0..num_labels {
            if context.is_cancelled() {
                log::warn!("One-vs-all training cancelled before label {}", label);
                return Err(ClassifierError::Cancelled { label });
            }
            if self.base.verbosity > 0 {
                log::info!("label {} out of {}", label, num_labels);
            }

            learner.init(Arc::clone(&boolean_space), predicted)?;

            let mut positives = 0usize;
            for (i, &raw) in combination_of.iter().enumerate() {
                let is_member = labels.contains(raw, label);
                positives += is_member as usize;
                binary_data.modify_feature(i, predicted, if is_member { 1.0 } else { 0.0 });
            }
            log::trace!(
                "label {}: {} positive of {} examples",
                label,
                positives,
                combination_of.len()
            );

            let sub_classifier = learner.generate(context, &binary_data, weights, features)?;
            current.push(sub_classifier);
        }

        Ok(current)
    }
}

impl ClassifierGenerator for OneVsAllGenerator {
    fn name(&self) -> &str {
        "onevsall"
    }

    fn configure(
        &mut self,
        config: &Configuration,
        registry: &GeneratorRegistry,
        unparsed: &mut Vec<String>,
    ) -> Result<()> {
        self.base.configure(config)?;
        let learner = registry.get_trainer(WEAK_LEARNER_KEY, config, unparsed)?;
        self.set_weak_learner(learner);
        unparsed.extend(config.unrecognized_keys(&self.options()));
        Ok(())
    }

    fn defaults(&mut self) {
        self.base.defaults();
        self.weak_learner = None;
    }

    fn options(&self) -> ConfigOptions {
        let nested = self
            .weak_learner
            .as_ref()
            .map(|learner| {
                learner
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .options()
            });
        self.base
            .options()
            .subconfig(WEAK_LEARNER_KEY, nested, "binary classifier trained for each label value")
    }

    fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()> {
        self.base.init(Arc::clone(&feature_space), predicted)?;
        self.template = Some(OneVsAllClassifier::new(feature_space, predicted));
        Ok(())
    }

    fn generate(
        &self,
        context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        features: &[Feature],
    ) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(self.train(context, data, weights, features)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_space::FeatureInfo;
    use crate::math::Array2;
    use crate::models::prior::PriorGenerator;

    fn problem(targets: &[f32]) -> (Arc<FeatureSpace>, TrainingData) {
        let fs = Arc::new(FeatureSpace::new(vec![
            FeatureInfo::continuous("x"),
            FeatureInfo::categorical("label", vec![]),
        ]));
        let values = targets
            .iter()
            .enumerate()
            .flat_map(|(i, &t)| [i as f32, t])
            .collect();
        let x = Array2::from_shape_vec((targets.len(), 2), values).unwrap();
        let data = TrainingData::new(x, Arc::clone(&fs)).unwrap();
        (fs, data)
    }

    #[test]
    fn generate_before_init_is_usage_error() {
        let (_, data) = problem(&[0.0, 1.0]);
        let generator = OneVsAllGenerator::new()
            .with_weak_learner(Box::new(PriorGenerator::default()))
            .with_labels(LabelCombinations::singletons(2));
        let err = generator
            .generate(&mut TrainContext::default(), &data, &[1.0, 1.0], &[Feature(0)])
            .unwrap_err();
        assert!(matches!(err, ClassifierError::NotInitialized { .. }));
    }

    #[test]
    fn missing_weak_learner_is_usage_error() {
        let (fs, data) = problem(&[0.0, 1.0]);
        let mut generator = OneVsAllGenerator::new().with_labels(LabelCombinations::singletons(2));
        generator.init(fs, Feature(1)).unwrap();
        let err = generator
            .generate(&mut TrainContext::default(), &data, &[1.0, 1.0], &[Feature(0)])
            .unwrap_err();
        assert!(matches!(err, ClassifierError::NoWeakLearner));
    }

    #[test]
    fn zero_labels_rejected() {
        let (fs, data) = problem(&[]);
        let mut generator = OneVsAllGenerator::new()
            .with_weak_learner(Box::new(PriorGenerator::default()))
            .with_labels(LabelCombinations::singletons(0));
        generator.init(fs, Feature(1)).unwrap();
        let err = generator
            .generate(&mut TrainContext::default(), &data, &[], &[Feature(0)])
            .unwrap_err();
        assert!(matches!(err, ClassifierError::NoLabels));
    }

    #[test]
    fn prior_per_label_matches_class_frequency() {
        let (fs, data) = problem(&[0.0, 1.0, 1.0, 2.0]);
        let mut generator = OneVsAllGenerator::new()
            .with_weak_learner(Box::new(PriorGenerator::default()))
            .with_labels(LabelCombinations::singletons(3));
        generator.init(fs, Feature(1)).unwrap();

        let model = generator
            .train(&mut TrainContext::default(), &data, &[1.0; 4], &[Feature(0)])
            .unwrap();

        assert_eq!(model.predict(data.row(0)), vec![0.25, 0.5, 0.25]);
        assert_eq!(model.predict_label(data.row(0)), Some(1));
    }

    #[test]
    fn cancelled_context_stops_before_first_label() {
        let (fs, data) = problem(&[0.0, 1.0]);
        let mut generator = OneVsAllGenerator::new()
            .with_weak_learner(Box::new(PriorGenerator::default()))
            .with_labels(LabelCombinations::singletons(2));
        generator.init(fs, Feature(1)).unwrap();

        let mut context = TrainContext::default();
        context.cancel();
        let err = generator
            .generate(&mut context, &data, &[1.0, 1.0], &[Feature(0)])
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Cancelled { label: 0 }));
    }

    #[test]
    fn options_survive_poisoned_learner_lock() {
        let generator =
            OneVsAllGenerator::new().with_weak_learner(Box::new(PriorGenerator::default()));
        let learner = generator.weak_learner.as_ref().unwrap();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = learner.lock().unwrap();
                    panic!("learner panicked mid-training");
                })
                .join();
        });
        assert!(learner.is_poisoned());

        match &generator.options().get(WEAK_LEARNER_KEY).unwrap().kind {
            crate::config::OptionKind::Subconfig(Some(nested)) => {
                assert!(nested.contains("verbosity"))
            }
            other => panic!("nested options dropped: {:?}", other),
        }
    }

    #[test]
    fn defaults_clears_weak_learner() {
        let mut generator =
            OneVsAllGenerator::new().with_weak_learner(Box::new(PriorGenerator::default()));
        generator.defaults();
        assert!(!generator.has_weak_learner());
    }
}
