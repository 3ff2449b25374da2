//! Training data and label bookkeeping for multiclass / multi-label problems.
//!
//! `TrainingData` stores examples row-major against a shared `FeatureSpace`.
//! `LabelCombinations` maps each raw target value of the predicted feature to
//! the set of labels that are jointly true for it.
use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use crate::error::{ClassifierError, Result};
use crate::feature_space::{Feature, FeatureSpace};
use crate::math::Array2;

#[derive(Debug, Clone)]
pub struct TrainingData {
    x: Array2<f32>,
    feature_space: Arc<FeatureSpace>,
}

impl TrainingData {
    /// Wrap a feature matrix; the column count must match the feature space.
    pub fn new(x: Array2<f32>, feature_space: Arc<FeatureSpace>) -> Result<Self> {
        if x.ncols() != feature_space.len() {
            return Err(ClassifierError::FeatureSpaceMismatch {
                expected: feature_space.len(),
                got: x.ncols(),
            });
        }
        Ok(Self { x, feature_space })
    }

    pub fn example_count(&self) -> usize {
        self.x.nrows()
    }

    pub fn feature_space(&self) -> &Arc<FeatureSpace> {
        &self.feature_space
    }

    pub fn value(&self, example: usize, feature: Feature) -> f32 {
        self.x[(example, feature.index())]
    }

    pub fn row(&self, example: usize) -> &[f32] {
        self.x.row_slice(example)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.x.rows()
    }

    /// All values of one feature, in example order.
    pub fn column(&self, feature: Feature) -> Vec<f32> {
        self.x.column(feature.index())
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.x
    }

    /// Independent copy whose values can be rewritten without touching `self`.
    pub fn make_copy(&self) -> TrainingData {
        self.clone()
    }

    /// Rebind to another feature space describing the same columns.
    pub fn set_feature_space(&mut self, feature_space: Arc<FeatureSpace>) -> Result<()> {
        if feature_space.len() != self.feature_space.len() {
            return Err(ClassifierError::FeatureSpaceMismatch {
                expected: self.feature_space.len(),
                got: feature_space.len(),
            });
        }
        self.feature_space = feature_space;
        Ok(())
    }

    pub fn modify_feature(&mut self, example: usize, feature: Feature, value: f32) {
        self.x[(example, feature.index())] = value;
    }
}

impl Index<(usize, Feature)> for TrainingData {
    type Output = f32;

    fn index(&self, index: (usize, Feature)) -> &Self::Output {
        &self.x[(index.0, index.1.index())]
    }
}

/// Ordered label sets indexed by raw target value.
///
/// Entry `k` lists the labels jointly true for examples whose predicted
/// feature holds `k`. Every label is below `num_labels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCombinations {
    combinations: Vec<Vec<usize>>,
    num_labels: usize,
}

impl LabelCombinations {
    pub fn new(combinations: Vec<Vec<usize>>, num_labels: usize) -> Result<Self> {
        for (idx, combination) in combinations.iter().enumerate() {
            if let Some(&label) = combination.iter().find(|&&l| l >= num_labels) {
                return Err(ClassifierError::LabelOutOfRange {
                    label,
                    combination: idx,
                    num_labels,
                });
            }
        }
        Ok(Self {
            combinations,
            num_labels,
        })
    }

    /// Plain multiclass layout: raw value `k` means exactly label `k`.
    pub fn singletons(num_labels: usize) -> Self {
        Self {
            combinations: (0..num_labels).map(|label| vec![label]).collect(),
            num_labels,
        }
    }

    /// Encode one label set per example into raw target values.
    ///
    /// Members are sorted and deduplicated, identical sets share a raw value
    /// (assigned in first-seen order) and empty sets are kept. The label count
    /// is one past the largest label seen.
    pub fn from_label_sets<I, S>(rows: I) -> (Self, Vec<f32>)
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = usize>,
    {
        let mut index: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut combinations: Vec<Vec<usize>> = Vec::new();
        let mut raw_targets = Vec::new();
        let mut num_labels = 0;

        for row in rows {
            let mut labels: Vec<usize> = row.into_iter().collect();
            labels.sort_unstable();
            labels.dedup();
            if let Some(&max) = labels.last() {
                num_labels = num_labels.max(max + 1);
            }
            let raw = *index.entry(labels.clone()).or_insert_with(|| {
                combinations.push(labels);
                combinations.len() - 1
            });
            raw_targets.push(raw as f32);
        }

        log::trace!(
            "Encoded {} examples into {} label combinations over {} labels",
            raw_targets.len(),
            combinations.len(),
            num_labels
        );

        (
            Self {
                combinations,
                num_labels,
            },
            raw_targets,
        )
    }

    /// Raise the label count, e.g. when some labels never occur in the data.
    pub fn with_num_labels(mut self, num_labels: usize) -> Self {
        self.num_labels = self.num_labels.max(num_labels);
        self
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn get(&self, raw: usize) -> Option<&[usize]> {
        self.combinations.get(raw).map(Vec::as_slice)
    }

    /// Resolve a raw target value to its combination index.
    ///
    /// Negative, fractional or non-finite values and values past the end of
    /// the list are rejected.
    pub fn resolve(&self, example: usize, value: f32) -> Result<usize> {
        let out_of_range = ClassifierError::LabelCombinationOutOfRange {
            example,
            value,
            len: self.combinations.len(),
        };
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(out_of_range);
        }
        let raw = value as usize;
        if raw >= self.combinations.len() {
            return Err(out_of_range);
        }
        Ok(raw)
    }

    pub fn contains(&self, raw: usize, label: usize) -> bool {
        self.combinations[raw].contains(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_space::FeatureInfo;

    fn data() -> TrainingData {
        let fs = Arc::new(FeatureSpace::new(vec![
            FeatureInfo::continuous("x"),
            FeatureInfo::continuous("label"),
        ]));
        let x = Array2::from_shape_vec((2, 2), vec![0.5, 0.0, 1.5, 1.0]).unwrap();
        TrainingData::new(x, fs).unwrap()
    }

    #[test]
    fn modify_feature_on_copy_keeps_source() {
        let source = data();
        let mut copy = source.make_copy();
        copy.modify_feature(1, Feature(1), 7.0);

        assert_eq!(copy[(1, Feature(1))], 7.0);
        assert_eq!(source[(1, Feature(1))], 1.0);
    }

    #[test]
    fn new_reports_feature_space_width_as_expected() {
        let fs = Arc::new(FeatureSpace::new(vec![FeatureInfo::continuous("x")]));
        let x = Array2::from_shape_vec((1, 3), vec![0.0, 1.0, 2.0]).unwrap();
        assert!(matches!(
            TrainingData::new(x, fs),
            Err(ClassifierError::FeatureSpaceMismatch { expected: 1, got: 3 })
        ));
    }

    #[test]
    fn set_feature_space_requires_same_width() {
        let mut d = data();
        let narrow = Arc::new(FeatureSpace::new(vec![FeatureInfo::continuous("x")]));
        assert!(matches!(
            d.set_feature_space(narrow),
            Err(ClassifierError::FeatureSpaceMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn label_sets_are_deduplicated_in_first_seen_order() {
        let (combos, raw) =
            LabelCombinations::from_label_sets(vec![vec![2, 0], vec![1], vec![0, 2, 2], vec![]]);

        assert_eq!(raw, vec![0.0, 1.0, 0.0, 2.0]);
        assert_eq!(combos.get(0), Some(&[0, 2][..]));
        assert_eq!(combos.get(2), Some(&[][..]));
        assert_eq!(combos.num_labels(), 3);
    }

    #[test]
    fn new_rejects_labels_past_count() {
        let err = LabelCombinations::new(vec![vec![0], vec![0, 4]], 2).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::LabelOutOfRange { label: 4, combination: 1, num_labels: 2 }
        ));
    }

    #[test]
    fn resolve_rejects_non_index_values() {
        let combos = LabelCombinations::singletons(2);
        assert_eq!(combos.resolve(0, 1.0).unwrap(), 1);
        assert!(combos.resolve(0, 2.0).is_err());
        assert!(combos.resolve(0, -1.0).is_err());
        assert!(combos.resolve(0, 0.5).is_err());
        assert!(combos.resolve(0, f32::NAN).is_err());
    }
}
