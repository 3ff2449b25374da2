//! ova-classifiers: one-vs-all reduction of multiclass and multi-label
//! classification to binary weak learners.
//!
//! A `OneVsAllGenerator` trains one binary model per label value with a
//! configurable weak learner (GBDT, decision stump, or weighted prior) and
//! assembles them into a `OneVsAllClassifier`. Generators are built from
//! JSON configuration through an explicit `GeneratorRegistry`.
pub mod config;
pub mod context;
pub mod data_handling;
pub mod error;
pub mod feature_space;
pub mod io;
pub mod math;
pub mod models;

pub use config::Configuration;
pub use context::TrainContext;
pub use data_handling::{LabelCombinations, TrainingData};
pub use error::{ClassifierError, Result};
pub use feature_space::{Feature, FeatureInfo, FeatureKind, FeatureSpace};
pub use models::{
    Classifier, ClassifierGenerator, GeneratorRegistry, OneVsAllClassifier, OneVsAllGenerator,
};
