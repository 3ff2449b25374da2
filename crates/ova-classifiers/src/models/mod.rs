pub mod classifier_trait;
pub mod factory;
pub mod gbdt;
pub mod onevsall;
pub mod onevsall_generator;
pub mod prior;
pub mod stump;

pub use classifier_trait::{Classifier, ClassifierGenerator, GeneratorBase};
pub use factory::{GeneratorFactory, GeneratorRegistry};
pub use onevsall::OneVsAllClassifier;
pub use onevsall_generator::OneVsAllGenerator;
