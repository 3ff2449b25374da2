use crate::feature_space::Feature;
use crate::math::ShapeError;

/// Errors raised while configuring generators or training classifiers.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// `generate` was called before `init`.
    #[error("{generator} generator used before init()")]
    NotInitialized { generator: String },

    /// The one-vs-all generator has no weak learner to train with.
    #[error("no weak learner bound; configure a `weak_learner` block or assign one directly")]
    NoWeakLearner,

    /// No label combinations were supplied, or they describe zero labels.
    #[error("label combinations must describe at least one label")]
    NoLabels,

    /// A label inside a combination is not below the declared label count.
    #[error("label {label} in combination {combination} is not below the label count {num_labels}")]
    LabelOutOfRange {
        label: usize,
        combination: usize,
        num_labels: usize,
    },

    /// A raw target value does not index into the label combination list.
    #[error("example {example} has raw target {value}, which does not index into {len} label combinations")]
    LabelCombinationOutOfRange {
        example: usize,
        value: f32,
        len: usize,
    },

    #[error("weight vector has {weights} entries but the training data has {examples} examples")]
    WeightLengthMismatch { weights: usize, examples: usize },

    #[error("feature space has {got} features, expected {expected}")]
    FeatureSpaceMismatch { expected: usize, got: usize },

    #[error("feature {feature} is not part of a feature space with {n_features} features")]
    UnknownFeature { feature: Feature, n_features: usize },

    #[error("training data has zero examples")]
    EmptyTrainingData,

    #[error("no candidate features available for training")]
    NoCandidateFeatures,

    /// Generation stopped at a label boundary because the context was cancelled.
    #[error("training cancelled before label {label}")]
    Cancelled { label: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid value for configuration key `{key}`")]
    ConfigValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no generator registered under `{0}`")]
    UnknownGenerator(String),

    #[error("a generator is already registered under `{0}`")]
    DuplicateGenerator(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
