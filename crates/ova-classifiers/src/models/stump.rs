use std::sync::Arc;

use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::config::{ConfigOptions, Configuration, OptionKind, StumpParams};
use crate::context::TrainContext;
use crate::data_handling::TrainingData;
use crate::error::Result;
use crate::feature_space::{Feature, FeatureSpace};
use crate::models::classifier_trait::{
    check_training_inputs, usable_features, Classifier, ClassifierGenerator, GeneratorBase,
};
use crate::models::factory::GeneratorRegistry;

/// One split on one feature, with the probability of the boolean target on
/// either side.
#[derive(Debug, Clone, PartialEq)]
pub struct StumpClassifier {
    feature: Feature,
    threshold: f32,
    below: f32,
    above: f32,
}

impl StumpClassifier {
    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Classifier for StumpClassifier {
    fn label_count(&self) -> usize {
        2
    }

    fn predict(&self, row: &[f32]) -> Vec<f32> {
        debug_assert!(
            self.feature.index() < row.len(),
            "row has {} values but the stump splits on feature {}",
            row.len(),
            self.feature
        );
        let p = if row[self.feature.index()] <= self.threshold {
            self.below
        } else {
            self.above
        };
        vec![1.0 - p, p]
    }

    fn name(&self) -> &str {
        "stump"
    }
}

#[derive(Debug, Clone, Default)]
pub struct StumpGenerator {
    base: GeneratorBase,
    params: StumpParams,
}

impl StumpGenerator {
    pub fn new(params: StumpParams) -> Self {
        Self {
            base: GeneratorBase::default(),
            params,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    error: f64,
    threshold: f32,
    below: f32,
    above: f32,
}

/// Lowest weighted-error split of one feature.
fn best_split(values: &mut [(f32, f64, bool)], prior: f32) -> Candidate {
    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: f64 = values.iter().map(|v| v.1).sum();
    let positive: f64 = values.iter().filter(|v| v.2).map(|v| v.1).sum();
    let rate = |pos: f64, weight: f64| {
        if weight > 0.0 {
            (pos / weight) as f32
        } else {
            prior
        }
    };

    let mut best = Candidate {
        error: positive.min(total - positive),
        threshold: f32::INFINITY,
        below: rate(positive, total),
        above: rate(positive, total),
    };

    let (mut left_w, mut left_p) = (0.0f64, 0.0f64);
    for i in 0..values.len().saturating_sub(1) {
        let (value, weight, is_positive) = values[i];
        left_w += weight;
        if is_positive {
            left_p += weight;
        }
        let next = values[i + 1].0;
        if next == value {
            continue;
        }
        let (right_w, right_p) = (total - left_w, positive - left_p);
        let error = left_p.min(left_w - left_p) + right_p.min(right_w - right_p);
        if error < best.error {
            best = Candidate {
                error,
                threshold: value + (next - value) / 2.0,
                below: rate(left_p, left_w),
                above: rate(right_p, right_w),
            };
        }
    }
    best
}

impl ClassifierGenerator for StumpGenerator {
    fn name(&self) -> &str {
        "stump"
    }

    fn configure(
        &mut self,
        config: &Configuration,
        _registry: &GeneratorRegistry,
        unparsed: &mut Vec<String>,
    ) -> Result<()> {
        self.base.configure(config)?;
        let params: StumpParams = config.deserialize()?;
        params.validate()?;
        self.params = params;
        unparsed.extend(config.unrecognized_keys(&self.options()));
        Ok(())
    }

    fn defaults(&mut self) {
        self.base.defaults();
        self.params = StumpParams::default();
    }

    fn options(&self) -> ConfigOptions {
        self.base.options().add(
            "feature_fraction",
            OptionKind::Float,
            self.params.feature_fraction,
            "fraction of candidate features searched per training call",
        )
    }

    fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()> {
        self.base.init(feature_space, predicted)
    }

    fn generate(
        &self,
        context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        features: &[Feature],
    ) -> Result<Box<dyn Classifier>> {
        let (_, predicted) = self.base.bound(self.name())?;
        check_training_inputs(data, weights)?;
        let mut usable = usable_features(features, predicted)?;

        if self.params.feature_fraction < 1.0 {
            let keep = ((usable.len() as f32 * self.params.feature_fraction).ceil() as usize).max(1);
            let mut sampled: Vec<Feature> =
                usable.choose_multiple(context.rng(), keep).copied().collect();
            sampled.sort_unstable();
            usable = sampled;
        }

        let targets: Vec<bool> = (0..data.example_count())
            .map(|i| data.value(i, predicted) >= 0.5)
            .collect();
        let total: f64 = weights.iter().map(|&w| w as f64).sum();
        let positive: f64 = weights
            .iter()
            .zip(&targets)
            .filter(|(_, t)| **t)
            .map(|(&w, _)| w as f64)
            .sum();
        let prior = if total > 0.0 {
            (positive / total) as f32
        } else {
            0.0
        };

        let candidates: Vec<Candidate> = usable
            .par_iter()
            .map(|&feature| {
                let mut values: Vec<(f32, f64, bool)> = (0..data.example_count())
                    .map(|i| (data.value(i, feature), weights[i] as f64, targets[i]))
                    .collect();
                best_split(&mut values, prior)
            })
            .collect();

        let mut chosen = 0;
        for (idx, candidate) in candidates.iter().enumerate() {
            if candidate.error < candidates[chosen].error {
                chosen = idx;
            }
        }
        let best = candidates[chosen];

        if self.base.verbosity > 1 {
            log::debug!(
                "stump split on {} at {} (weighted error {:.4})",
                usable[chosen],
                best.threshold,
                best.error
            );
        }

        Ok(Box::new(StumpClassifier {
            feature: usable[chosen],
            threshold: best.threshold,
            below: best.below,
            above: best.above,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_space::FeatureInfo;
    use crate::math::Array2;

    fn dataset() -> (Arc<FeatureSpace>, TrainingData) {
        let fs = Arc::new(FeatureSpace::new(vec![
            FeatureInfo::continuous("noise"),
            FeatureInfo::continuous("signal"),
            FeatureInfo::boolean("target"),
        ]));
        let x = Array2::from_rows(vec![
            vec![0.3, 0.1, 0.0],
            vec![0.9, 0.2, 0.0],
            vec![0.1, 0.3, 0.0],
            vec![0.8, 0.7, 1.0],
            vec![0.2, 0.8, 1.0],
            vec![0.7, 0.9, 1.0],
        ])
        .unwrap();
        let data = TrainingData::new(x, Arc::clone(&fs)).unwrap();
        (fs, data)
    }

    #[test]
    fn picks_separating_feature() {
        let (fs, data) = dataset();
        let mut generator = StumpGenerator::default();
        generator.init(fs, Feature(2)).unwrap();

        let model = generator
            .generate(
                &mut TrainContext::default(),
                &data,
                &[1.0; 6],
                &[Feature(0), Feature(1), Feature(2)],
            )
            .unwrap();

        assert_eq!(model.predict(&[0.5, 0.15, 0.0]), vec![1.0, 0.0]);
        assert_eq!(model.predict(&[0.5, 0.85, 0.0]), vec![0.0, 1.0]);
    }

    #[test]
    #[should_panic]
    fn short_row_is_rejected() {
        let stump = StumpClassifier {
            feature: Feature(2),
            threshold: 0.5,
            below: 0.0,
            above: 1.0,
        };
        stump.predict(&[0.1, 0.2]);
    }

    #[test]
    fn constant_feature_falls_back_to_prior() {
        let mut values = vec![(1.0f32, 1.0f64, true), (1.0, 1.0, false), (1.0, 2.0, true)];
        let candidate = best_split(&mut values, 0.0);
        assert_eq!(candidate.threshold, f32::INFINITY);
        assert!((candidate.below - 0.75).abs() < 1e-6);
    }

    #[test]
    fn rejects_target_as_only_feature() {
        let (fs, data) = dataset();
        let mut generator = StumpGenerator::default();
        generator.init(fs, Feature(2)).unwrap();
        let err = generator
            .generate(&mut TrainContext::default(), &data, &[1.0; 6], &[Feature(2)])
            .unwrap_err();
        assert!(matches!(err, crate::error::ClassifierError::NoCandidateFeatures));
    }

    #[test]
    fn configure_rejects_bad_fraction() {
        let config =
            Configuration::from_json_str(r#"{"type": "stump", "feature_fraction": 0.0}"#).unwrap();
        let mut generator = StumpGenerator::default();
        let mut unparsed = Vec::new();
        assert!(generator
            .configure(&config, &GeneratorRegistry::new(), &mut unparsed)
            .is_err());
    }
}
