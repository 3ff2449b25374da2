//! Feature schema shared between training data and classifiers.
//!
//! A `FeatureSpace` is immutable once wrapped in an `Arc`. Deriving a
//! variant with one feature re-typed (the boolean target used by the
//! one-vs-all reduction) produces an independently owned copy; the
//! original is never touched.
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Index of a feature inside a `FeatureSpace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Feature(pub usize);

impl Feature {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value semantics of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Continuous,
    /// Values are category indices; `categories` names them when known.
    Categorical { categories: Vec<String> },
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureInfo {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn continuous(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Continuous)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FeatureKind::Boolean)
    }

    pub fn categorical(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self::new(name, FeatureKind::Categorical { categories })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSpace {
    features: Vec<FeatureInfo>,
}

impl FeatureSpace {
    pub fn new(features: Vec<FeatureInfo>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn info(&self, feature: Feature) -> Result<&FeatureInfo> {
        self.features
            .get(feature.0)
            .ok_or(ClassifierError::UnknownFeature {
                feature,
                n_features: self.features.len(),
            })
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> {
        (0..self.features.len()).map(Feature)
    }

    /// Look a feature up by name.
    pub fn feature_named(&self, name: &str) -> Option<Feature> {
        self.features.iter().position(|f| f.name == name).map(Feature)
    }

    pub fn make_copy(&self) -> FeatureSpace {
        self.clone()
    }

    /// Replace the declared semantics of one feature.
    pub fn set_info(&mut self, feature: Feature, info: FeatureInfo) -> Result<()> {
        let n_features = self.features.len();
        let slot = self
            .features
            .get_mut(feature.0)
            .ok_or(ClassifierError::UnknownFeature { feature, n_features })?;
        *slot = info;
        Ok(())
    }

    /// Copy of this space with `feature` re-declared as `kind`, keeping its name.
    pub fn with_kind(&self, feature: Feature, kind: FeatureKind) -> Result<Arc<FeatureSpace>> {
        let name = self.info(feature)?.name.clone();
        let mut copy = self.make_copy();
        copy.set_info(feature, FeatureInfo::new(name, kind))?;
        Ok(Arc::new(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> FeatureSpace {
        FeatureSpace::new(vec![
            FeatureInfo::continuous("height"),
            FeatureInfo::categorical("species", vec!["a".into(), "b".into(), "c".into()]),
        ])
    }

    #[test]
    fn with_kind_leaves_original_untouched() {
        let original = Arc::new(space());
        let derived = original.with_kind(Feature(1), FeatureKind::Boolean).unwrap();

        assert_eq!(derived.info(Feature(1)).unwrap().kind, FeatureKind::Boolean);
        assert_eq!(derived.info(Feature(1)).unwrap().name, "species");
        assert!(matches!(
            original.info(Feature(1)).unwrap().kind,
            FeatureKind::Categorical { .. }
        ));
        assert_eq!(
            derived.info(Feature(0)).unwrap(),
            original.info(Feature(0)).unwrap()
        );
    }

    #[test]
    fn set_info_rejects_unknown_feature() {
        let mut fs = space();
        let err = fs.set_info(Feature(7), FeatureInfo::boolean("x")).unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownFeature { n_features: 2, .. }));
    }

    #[test]
    fn feature_named_finds_column() {
        assert_eq!(space().feature_named("species"), Some(Feature(1)));
        assert_eq!(space().feature_named("weight"), None);
    }
}
