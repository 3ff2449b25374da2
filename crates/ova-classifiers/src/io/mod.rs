//! Readers that turn delimited text into training data.
pub mod delimited;

pub use delimited::{read_labeled_csv, read_labeled_from_reader, DelimitedReaderConfig, LabeledDataset};
