//! CSV / TSV reader for labeled classification data.
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::{LabelCombinations, TrainingData};
use crate::feature_space::{Feature, FeatureInfo, FeatureSpace};
use crate::math::Array2;

/// Parsed data ready for one-vs-all training.
///
/// Feature columns keep their header order; the label column is appended
/// last as the predicted feature and holds raw target values indexing
/// `labels`.
#[derive(Debug)]
pub struct LabeledDataset {
    pub data: TrainingData,
    pub predicted: Feature,
    pub label_names: Vec<String>,
    pub labels: LabelCombinations,
}

impl LabeledDataset {
    /// Every feature except the predicted one.
    pub fn input_features(&self) -> Vec<Feature> {
        self.data
            .feature_space()
            .features()
            .filter(|&f| f != self.predicted)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DelimitedReaderConfig {
    /// Column holding the label (or label list in multi-label mode).
    pub label_column: String,
    pub delimiter: u8,
    /// When set, label cells are lists split on this character.
    pub multi_label_separator: Option<char>,
    /// Optional list of feature columns to load (in order).
    /// When `None`, every column except the label is a feature.
    pub feature_columns: Option<Vec<String>>,
}

impl Default for DelimitedReaderConfig {
    fn default() -> Self {
        Self {
            label_column: "label".to_string(),
            delimiter: b',',
            multi_label_separator: None,
            feature_columns: None,
        }
    }
}

pub fn read_labeled_csv<P: AsRef<Path>>(
    path: P,
    config: &DelimitedReaderConfig,
) -> Result<LabeledDataset> {
    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open data file: {}", path.as_ref().display()))?;
    read_labeled_from_reader(file, config)
}

pub fn read_labeled_from_reader<R: Read>(
    reader: R,
    config: &DelimitedReaderConfig,
) -> Result<LabeledDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read header row")?
        .clone();

    let label_idx = find_column(&headers, &config.label_column)
        .ok_or_else(|| anyhow!("Missing label column '{}'", config.label_column))?;
    let feature_indices = resolve_feature_indices(&headers, config, label_idx)?;
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in header"));
    }

    let mut values = Vec::new();
    let mut label_cells = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        for &idx in &feature_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing feature value at row {}", row_idx + 1))?;
            let parsed = value.parse::<f32>().with_context(|| {
                format!(
                    "Invalid feature '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            values.push(parsed);
        }
        let label = record
            .get(label_idx)
            .ok_or_else(|| anyhow!("Missing label value at row {}", row_idx + 1))?;
        label_cells.push(label.to_string());
    }

    let mut label_ids: HashMap<String, usize> = HashMap::new();
    let mut label_names: Vec<String> = Vec::new();
    let mut label_id = |name: &str| -> usize {
        *label_ids.entry(name.to_string()).or_insert_with(|| {
            label_names.push(name.to_string());
            label_names.len() - 1
        })
    };

    let (labels, raw_targets) = match config.multi_label_separator {
        None => {
            let raw: Vec<f32> = label_cells.iter().map(|c| label_id(c) as f32).collect();
            (LabelCombinations::singletons(label_ids.len()), raw)
        }
        Some(separator) => {
            let sets: Vec<Vec<usize>> = label_cells
                .iter()
                .map(|cell| {
                    cell.split(separator)
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(&mut label_id)
                        .collect()
                })
                .collect();
            let (labels, raw) = LabelCombinations::from_label_sets(sets);
            (labels.with_num_labels(label_ids.len()), raw)
        }
    };

    let n_examples = label_cells.len();
    let n_columns = feature_indices.len() + 1;
    let mut matrix = Vec::with_capacity(n_examples * n_columns);
    let width = feature_indices.len();
    for (row, raw) in raw_targets.iter().enumerate() {
        matrix.extend_from_slice(&values[row * width..(row + 1) * width]);
        matrix.push(*raw);
    }
    let x = Array2::from_shape_vec((n_examples, n_columns), matrix)
        .context("Failed to build feature matrix")?;

    let mut infos: Vec<FeatureInfo> = feature_indices
        .iter()
        .map(|&idx| FeatureInfo::continuous(headers.get(idx).unwrap_or("")))
        .collect();
    infos.push(FeatureInfo::categorical(
        headers.get(label_idx).unwrap_or(&config.label_column),
        label_names.clone(),
    ));
    let predicted = Feature(infos.len() - 1);
    let data = TrainingData::new(x, Arc::new(FeatureSpace::new(infos)))
        .context("Failed to build training data")?;

    log::info!(
        "Loaded {} examples with {} features and {} labels",
        n_examples,
        width,
        labels.num_labels()
    );

    Ok(LabeledDataset {
        data,
        predicted,
        label_names,
        labels,
    })
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &DelimitedReaderConfig,
    label_idx: usize,
) -> Result<Vec<usize>> {
    if let Some(names) = &config.feature_columns {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = find_column(headers, name)
                .ok_or_else(|| anyhow!("Missing feature column '{}'", name))?;
            if idx == label_idx {
                return Err(anyhow!("Label column '{}' cannot also be a feature", name));
            }
            indices.push(idx);
        }
        return Ok(indices);
    }
    Ok((0..headers.len()).filter(|&idx| idx != label_idx).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_label_names_in_first_seen_order() {
        let text = "height,species,weight\n1.0,cat,4\n2.0,dog,9\n1.5,cat,5\n";
        let config = DelimitedReaderConfig {
            label_column: "species".to_string(),
            ..Default::default()
        };
        let dataset = read_labeled_from_reader(text.as_bytes(), &config).unwrap();

        assert_eq!(dataset.label_names, vec!["cat", "dog"]);
        assert_eq!(dataset.predicted, Feature(2));
        assert_eq!(dataset.data.column(dataset.predicted), vec![0.0, 1.0, 0.0]);
        assert_eq!(dataset.data.row(1), &[2.0, 9.0, 1.0]);
        assert_eq!(dataset.labels.num_labels(), 2);
        assert_eq!(dataset.input_features(), vec![Feature(0), Feature(1)]);
    }

    #[test]
    fn multi_label_cells_become_combinations() {
        let text = "x\ttags\n0.1\ta;b\n0.2\tb\n0.3\tb ; a\n0.4\t\n";
        let config = DelimitedReaderConfig {
            label_column: "tags".to_string(),
            delimiter: b'\t',
            multi_label_separator: Some(';'),
            feature_columns: None,
        };
        let dataset = read_labeled_from_reader(text.as_bytes(), &config).unwrap();

        assert_eq!(dataset.label_names, vec!["a", "b"]);
        assert_eq!(dataset.data.column(Feature(1)), vec![0.0, 1.0, 0.0, 2.0]);
        assert_eq!(dataset.labels.get(0), Some(&[0, 1][..]));
        assert_eq!(dataset.labels.get(2), Some(&[][..]));
    }

    #[test]
    fn bad_feature_value_names_row() {
        let text = "x,label\nabc,a\n";
        let err = read_labeled_from_reader(text.as_bytes(), &DelimitedReaderConfig::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"));
    }

    #[test]
    fn missing_label_column_is_reported() {
        let text = "x,y\n1,2\n";
        let err = read_labeled_from_reader(text.as_bytes(), &DelimitedReaderConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Missing label column"));
    }
}
