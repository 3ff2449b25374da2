use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::Write;

use ova_classifiers::config::Configuration;
use ova_classifiers::io::{read_labeled_csv, DelimitedReaderConfig};
use ova_classifiers::{ClassifierGenerator, GeneratorRegistry, OneVsAllGenerator, TrainContext};

const DEFAULT_CONFIG: &str = r#"{
    "type": "onevsall",
    "verbosity": 1,
    "weak_learner": {
        "type": "gbdt",
        "learning_rate": 0.1,
        "max_depth": 4,
        "num_boost_round": 30
    }
}"#;

fn save_predictions_to_csv(
    path: &str,
    label_names: &[String],
    scores: &ova_classifiers::math::Array2<f32>,
) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    writeln!(file, "{}", label_names.join(","))?;
    for row in scores.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{:.4}", v)).collect();
        writeln!(file, "{}", line.join(","))?;
    }
    Ok(())
}

/// Usage: onevsall_csv <data.csv> <label column> [config.json] [multi-label separator]
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let data_path = args
        .get(1)
        .ok_or_else(|| anyhow!("usage: onevsall_csv <data.csv> <label column> [config.json] [separator]"))?;
    let label_column = args.get(2).cloned().unwrap_or_else(|| "label".to_string());
    let config_text = match args.get(3) {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path))?,
        None => DEFAULT_CONFIG.to_string(),
    };

    let reader_config = DelimitedReaderConfig {
        label_column,
        multi_label_separator: args.get(4).and_then(|s| s.chars().next()),
        ..Default::default()
    };
    let dataset = read_labeled_csv(data_path, &reader_config)?;

    let registry = GeneratorRegistry::builtin();
    let config = Configuration::from_json_str(&config_text)?;
    let mut unparsed = Vec::new();
    let mut generator = OneVsAllGenerator::new();
    generator.configure(&config, &registry, &mut unparsed)?;
    for key in &unparsed {
        log::warn!("Ignoring unrecognised configuration key `{}`", key);
    }
    log::debug!("Generator options:\n{}", generator.options());

    generator.set_labels(dataset.labels.clone());
    generator.init(dataset.data.feature_space().clone(), dataset.predicted)?;

    let weights = vec![1.0; dataset.data.example_count()];
    let model = generator.train(
        &mut TrainContext::new(42),
        &dataset.data,
        &weights,
        &dataset.input_features(),
    )?;

    let scores = model.predict_batch(&dataset.data);
    let correct = dataset
        .data
        .rows()
        .enumerate()
        .filter(|(i, row)| {
            let raw = dataset.data.value(*i, dataset.predicted) as usize;
            match (model.predict_label(row), dataset.labels.get(raw)) {
                (Some(label), Some(members)) => members.contains(&label),
                _ => false,
            }
        })
        .count();
    println!(
        "Top label matches a true label for {}/{} training examples",
        correct,
        dataset.data.example_count()
    );

    save_predictions_to_csv("onevsall_scores.csv", &dataset.label_names, &scores)?;
    println!("Scores written to onevsall_scores.csv");
    Ok(())
}
