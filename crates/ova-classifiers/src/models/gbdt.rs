use std::fmt;
use std::sync::Arc;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use crate::config::{ConfigOptions, Configuration, GbdtParams, OptionKind};
use crate::context::TrainContext;
use crate::data_handling::TrainingData;
use crate::error::{ClassifierError, Result};
use crate::feature_space::{Feature, FeatureSpace};
use crate::models::classifier_trait::{
    check_training_inputs, usable_features, Classifier, ClassifierGenerator, GeneratorBase,
};
use crate::models::factory::GeneratorRegistry;

/// Gradient Boosting Decision Tree (GBDT) binary classifier
pub struct GbdtClassifier {
    model: GBDT,
    columns: Vec<Feature>,
}

impl GbdtClassifier {
    fn to_data(&self, row: &[f32]) -> Data {
        debug_assert!(
            self.columns.iter().all(|f| f.index() < row.len()),
            "row has {} values, shorter than the training layout",
            row.len()
        );
        let features = self.columns.iter().map(|f| row[f.index()]).collect();
        Data::new_training_data(features, 1.0, 0.0, None)
    }
}

impl fmt::Debug for GbdtClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbdtClassifier")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Classifier for GbdtClassifier {
    fn label_count(&self) -> usize {
        2
    }

    fn predict(&self, row: &[f32]) -> Vec<f32> {
        let test_x: DataVec = vec![self.to_data(row)];
        let p = self
            .model
            .predict(&test_x)
            .first()
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        vec![1.0 - p, p]
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[derive(Debug, Clone, Default)]
pub struct GbdtGenerator {
    base: GeneratorBase,
    params: GbdtParams,
}

impl GbdtGenerator {
    pub fn new(params: GbdtParams) -> Self {
        Self {
            base: GeneratorBase::default(),
            params,
        }
    }

    fn gbdt_config(&self, feature_size: usize) -> Config {
        let mut config = Config::new();
        config.set_feature_size(feature_size);
        config.set_shrinkage(self.params.learning_rate);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.num_boost_round as usize);
        config.set_debug(self.params.debug);
        config.set_training_optimization_level(self.params.training_optimization_level);
        config.set_loss(&self.params.loss_type);
        config
    }

    /// Label encoding expected by the configured loss.
    fn encode_target(&self, positive: bool) -> f32 {
        match (self.params.loss_type.as_str(), positive) {
            ("BinaryLogistic", true) => 1.0,
            ("BinaryLogistic", false) => 0.0,
            (_, true) => 1.0,
            (_, false) => -1.0,
        }
    }
}

fn validate(params: &GbdtParams) -> Result<()> {
    if params.num_boost_round == 0 {
        return Err(ClassifierError::Config(
            "num_boost_round must be at least 1".to_string(),
        ));
    }
    if params.max_depth == 0 {
        return Err(ClassifierError::Config(
            "max_depth must be at least 1".to_string(),
        ));
    }
    if !(params.learning_rate > 0.0) {
        return Err(ClassifierError::Config(format!(
            "learning_rate must be positive, got {}",
            params.learning_rate
        )));
    }
    Ok(())
}

impl ClassifierGenerator for GbdtGenerator {
    fn name(&self) -> &str {
        "gbdt"
    }

    fn configure(
        &mut self,
        config: &Configuration,
        _registry: &GeneratorRegistry,
        unparsed: &mut Vec<String>,
    ) -> Result<()> {
        self.base.configure(config)?;
        let params: GbdtParams = config.deserialize()?;
        validate(&params)?;
        self.params = params;
        unparsed.extend(config.unrecognized_keys(&self.options()));
        Ok(())
    }

    fn defaults(&mut self) {
        self.base.defaults();
        self.params = GbdtParams::default();
    }

    fn options(&self) -> ConfigOptions {
        let p = &self.params;
        self.base
            .options()
            .add("learning_rate", OptionKind::Float, p.learning_rate, "shrinkage per boosting round")
            .add("max_depth", OptionKind::Integer, p.max_depth, "maximum depth of each tree")
            .add("num_boost_round", OptionKind::Integer, p.num_boost_round, "number of boosting rounds")
            .add("debug", OptionKind::Boolean, p.debug, "print gbdt training diagnostics")
            .add(
                "training_optimization_level",
                OptionKind::Integer,
                p.training_optimization_level,
                "gbdt training optimization level (0-2)",
            )
            .add("loss_type", OptionKind::String, &p.loss_type, "gbdt loss function")
    }

    fn init(&mut self, feature_space: Arc<FeatureSpace>, predicted: Feature) -> Result<()> {
        self.base.init(feature_space, predicted)
    }

    fn generate(
        &self,
        _context: &mut TrainContext,
        data: &TrainingData,
        weights: &[f32],
        features: &[Feature],
    ) -> Result<Box<dyn Classifier>> {
        let (_, predicted) = self.base.bound(self.name())?;
        check_training_inputs(data, weights)?;
        let columns = usable_features(features, predicted)?;

        let mut train_x = DataVec::with_capacity(data.example_count());
        for (i, row) in data.rows().enumerate() {
            let train_row = columns.iter().map(|f| row[f.index()]).collect();
            let label = self.encode_target(row[predicted.index()] >= 0.5);
            train_x.push(Data::new_training_data(train_row, weights[i], label, None));
        }

        let mut gbdt = GBDT::new(&self.gbdt_config(columns.len()));
        gbdt.fit(&mut train_x);

        if self.base.verbosity > 1 {
            log::debug!(
                "gbdt trained {} rounds on {} examples over {} features",
                self.params.num_boost_round,
                data.example_count(),
                columns.len()
            );
        }

        Ok(Box::new(GbdtClassifier {
            model: gbdt,
            columns,
        }))
    }
}
