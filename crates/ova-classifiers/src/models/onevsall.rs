use std::sync::Arc;

use rayon::prelude::*;

use crate::data_handling::TrainingData;
use crate::feature_space::{Feature, FeatureSpace};
use crate::math::Array2;
use crate::models::classifier_trait::Classifier;

/// Ensemble of binary classifiers, one per label value.
///
/// The sub-classifier at position `v` detects label `v`; its probability of
/// the positive class is the ensemble's score for that label.
#[derive(Debug, Clone)]
pub struct OneVsAllClassifier {
    feature_space: Arc<FeatureSpace>,
    predicted: Feature,
    sub_classifiers: Vec<Arc<dyn Classifier>>,
}

impl OneVsAllClassifier {
    /// Empty ensemble; filled by one `push` per label.
    pub fn new(feature_space: Arc<FeatureSpace>, predicted: Feature) -> Self {
        Self {
            feature_space,
            predicted,
            sub_classifiers: Vec::new(),
        }
    }

    /// Append the model for the next label value.
    pub fn push(&mut self, sub_classifier: Box<dyn Classifier>) {
        self.sub_classifiers.push(Arc::from(sub_classifier));
    }

    pub fn feature_space(&self) -> &Arc<FeatureSpace> {
        &self.feature_space
    }

    pub fn predicted(&self) -> Feature {
        self.predicted
    }

    pub fn sub_classifiers(&self) -> &[Arc<dyn Classifier>] {
        &self.sub_classifiers
    }

    pub fn len(&self) -> usize {
        self.sub_classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_classifiers.is_empty()
    }

    fn positive_score(sub: &dyn Classifier, row: &[f32]) -> f32 {
        sub.predict(row).get(1).copied().unwrap_or(0.0)
    }

    /// Highest scoring label; ties go to the lower label.
    pub fn predict_label(&self, row: &[f32]) -> Option<usize> {
        let scores = self.predict(row);
        let mut best: Option<(usize, f32)> = None;
        for (label, &score) in scores.iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// Every label whose score reaches `threshold`, in label order.
    pub fn predict_label_set(&self, row: &[f32], threshold: f32) -> Vec<usize> {
        self.predict(row)
            .into_iter()
            .enumerate()
            .filter(|&(_, score)| score >= threshold)
            .map(|(label, _)| label)
            .collect()
    }

    /// Scores for every example, one row per example and one column per label.
    pub fn predict_batch(&self, data: &TrainingData) -> Array2<f32> {
        let n_labels = self.len();
        let scores: Vec<Vec<f32>> = (0..data.example_count())
            .into_par_iter()
            .map(|i| self.predict(data.row(i)))
            .collect();

        let mut out = Array2::zeros(data.example_count(), n_labels);
        for (i, row_scores) in scores.into_iter().enumerate() {
            out.row_slice_mut(i).copy_from_slice(&row_scores);
        }
        out
    }
}

impl Classifier for OneVsAllClassifier {
    fn label_count(&self) -> usize {
        self.sub_classifiers.len()
    }

    fn predict(&self, row: &[f32]) -> Vec<f32> {
        self.sub_classifiers
            .iter()
            .map(|sub| Self::positive_score(sub.as_ref(), row))
            .collect()
    }

    fn name(&self) -> &str {
        "onevsall"
    }
}
