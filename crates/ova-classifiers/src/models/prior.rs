use std::sync::Arc;

use crate::config::{ConfigOptions, Configuration};
use crate::context::TrainContext;
use crate::data_handling::TrainingData;
use crate::error::Result;
use crate::feature_space::{Feature, FeatureSpace};
use crate::models::classifier_trait::{
    check_training_inputs, Classifier, ClassifierGenerator, GeneratorBase,
};
use crate::models::factory::GeneratorRegistry;

/// Ignores the features and predicts the weighted rate of the boolean target.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorClassifier {
    positive_rate: f32,
}

impl PriorClassifier {
    pub fn positive_rate(&self) -> f32 {
        self.positive_rate
    }
}

impl Classifier for PriorClassifier {
    fn label_count(&self) -> usize {
        2
    }

    fn predict(&self, _row: &[f32]) -> Vec<f32> {
        vec![1.0 - self.positive_rate, self.positive_rate]
    }

    fn name(&self) -> &str {
        "prior"
    }
}

#[derive(Debug, Clone, Default)]
pub struct PriorGenerator {
    base: GeneratorBase,
}

impl ClassifierGenerator for PriorGenerator {
    fn name(&self) -> &str {
        "prior"
    }

    fn configure(
        &mut self,
        config: &Configuration,
        _registry: &GeneratorRegistry,
        unparsed: &mut Vec<String>,
    ) -> Result<()> {
        self.base.configure(config)?;
        unparsed.extend(config.unrecognized_keys(&self.options()));
        Ok(())
    }

    fn defaults(&mut self) {
        self.base.defaults();
    }

    fn options(&self) -> ConfigOptions {
        self.base.options()
    }

    fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()> {
        self.base.init(feature_space, predicted)
    }

    fn generate(
        &self,
        _context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        _features: &[Feature],
    ) -> Result<Box<dyn Classifier>> {
        let (_, predicted) = self.base.bound(self.name())?;
        check_training_inputs(data, weights)?;

        let (mut positive, mut total) = (0.0f64, 0.0f64);
        for (i, &w) in weights.iter().enumerate() {
            total += w as f64;
            if data.value(i, predicted) >= 0.5 {
                positive += w as f64;
            }
        }
        let positive_rate = if total > 0.0 {
            (positive / total) as f32
        } else {
            0.0
        };

        Ok(Box::new(PriorClassifier { positive_rate }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_space::FeatureInfo;
    use crate::math::Array2;

    #[test]
    fn prior_is_weighted_positive_rate() {
        let fs = Arc::new(FeatureSpace::new(vec![
            FeatureInfo::continuous("x"),
            FeatureInfo::boolean("y"),
        ]));
        let x = Array2::from_shape_vec((3, 2), vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        let data = TrainingData::new(x, Arc::clone(&fs)).unwrap();

        let mut generator = PriorGenerator::default();
        generator.init(fs, Feature(1)).unwrap();
        let model = generator
            .generate(&mut TrainContext::default(), &data, &[1.0, 2.0, 1.0], &[Feature(0)])
            .unwrap();

        let scores = model.predict(&[0.0, 0.0]);
        assert!((scores[1] - 0.5).abs() < 1e-6);
        assert!((scores[0] - 0.5).abs() < 1e-6);
    }
}
