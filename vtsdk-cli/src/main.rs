use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vtsdk::compare::{DEFAULT_MIN_SIMILARITY, DEFAULT_NOISE_TOLERANCE};
use vtsdk::search::DEFAULT_ACCEPTANCE_THRESHOLD;
use vtsdk::{
    CompareRequest, ComparisonConfig, Engine, EngineConfig, Envelope, LocateRequest, MatchConfig,
    Metadata, Metric, Rect, SearchRequest,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "VTSDK visual regression CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output on stderr.
    #[arg(long)]
    trace: bool,
}

fn default_min_similarity() -> i32 {
    DEFAULT_MIN_SIMILARITY
}

fn default_noise_tolerance() -> i32 {
    DEFAULT_NOISE_TOLERANCE
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum Operation {
    Compare {
        baseline_path: PathBuf,
        input_path: PathBuf,
        #[serde(default = "default_min_similarity")]
        min_similarity: i32,
        #[serde(default = "default_noise_tolerance")]
        noise_tolerance: i32,
        #[serde(default)]
        excluded_regions: Vec<Rect>,
    },
    Search {
        parent_path: PathBuf,
        child_path: PathBuf,
    },
    Locate {
        container_path: PathBuf,
        main_path: PathBuf,
        relative_path: PathBuf,
    },
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
struct EngineConfigJson {
    artifact_dir: Option<PathBuf>,
    parallel: bool,
    metric: Metric,
    acceptance_threshold: f64,
}

impl Default for EngineConfigJson {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            artifact_dir: cfg.artifact_dir,
            parallel: cfg.parallel,
            metric: cfg.matcher.metric,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl From<EngineConfigJson> for EngineConfig {
    fn from(value: EngineConfigJson) -> Self {
        let mut cfg = EngineConfig::default()
            .with_match_config(MatchConfig {
                metric: value.metric,
                acceptance_threshold: value.acceptance_threshold,
                parallel: value.parallel,
            })
            .with_parallel(value.parallel);
        cfg.artifact_dir = value.artifact_dir;
        cfg
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Config {
    #[serde(flatten)]
    operation: Operation,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    output_path: Option<PathBuf>,
    #[serde(default)]
    engine: EngineConfigJson,
}

impl Config {
    /// Runs the configured operation and returns the pretty envelope.
    fn run(self) -> String {
        let engine = Engine::new(self.engine.into());
        match self.operation {
            Operation::Compare {
                baseline_path,
                input_path,
                min_similarity,
                noise_tolerance,
                excluded_regions,
            } => engine
                .compare_envelope(&CompareRequest {
                    baseline_path,
                    input_path,
                    config: ComparisonConfig::new(min_similarity, noise_tolerance)
                        .with_excluded_regions(excluded_regions)
                        .with_metadata(self.metadata),
                })
                .to_json_pretty(),
            Operation::Search {
                parent_path,
                child_path,
            } => engine
                .search_envelope(&SearchRequest {
                    parent_path,
                    child_path,
                    metadata: self.metadata,
                })
                .to_json_pretty(),
            Operation::Locate {
                container_path,
                main_path,
                relative_path,
            } => engine
                .locate_envelope(&LocateRequest {
                    container_path,
                    main_path,
                    relative_path,
                    metadata: self.metadata,
                })
                .to_json_pretty(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("vtsdk=info".parse()?))
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let output_path = config.output_path.clone();
    let json = config.run();

    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, Operation, EXAMPLE_JSON, SCHEMA_JSON};
    use vtsdk::{Metric, Rect};

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        match config.operation {
            Operation::Compare {
                excluded_regions, ..
            } => assert_eq!(excluded_regions, vec![Rect::new(0, 0, 119, 39)]),
            other => panic!("unexpected operation {other:?}"),
        }
        assert_eq!(config.metadata["testName"], "login_screen");
        let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON).unwrap();
        assert!(schema["properties"]["operation"].is_object());
    }

    #[test]
    fn compare_defaults_apply() {
        let config: Config = serde_json::from_str(
            r#"{"operation": "compare", "baseline_path": "a.png", "input_path": "b.png"}"#,
        )
        .unwrap();
        assert_eq!(
            config.operation,
            Operation::Compare {
                baseline_path: "a.png".into(),
                input_path: "b.png".into(),
                min_similarity: 95,
                noise_tolerance: 20,
                excluded_regions: Vec::new(),
            }
        );
        assert!(config.metadata.is_empty());
        assert_eq!(config.engine.metric, Metric::Ssd);
        assert_eq!(config.engine.acceptance_threshold, 95.0);
    }

    #[test]
    fn locate_with_engine_section() {
        let config: Config = serde_json::from_str(
            r#"{
                "operation": "locate",
                "container_path": "screen.png",
                "main_path": "button.png",
                "relative_path": "label.png",
                "engine": { "metric": "zncc", "parallel": false }
            }"#,
        )
        .unwrap();
        assert!(matches!(config.operation, Operation::Locate { .. }));
        assert_eq!(config.engine.metric, Metric::Zncc);
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.acceptance_threshold, 95.0);
    }

    #[test]
    fn missing_file_yields_error_envelope() {
        let config: Config = serde_json::from_str(
            r#"{"operation": "search", "parent_path": "/nonexistent/p.png", "child_path": "/nonexistent/c.png",
                "metadata": {"run": 3}}"#,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&config.run()).unwrap();
        assert_eq!(value["error"]["kind"], "InvalidPath");
        assert_eq!(value["found"], false);
        assert_eq!(value["metadata"]["run"], 3);
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = serde_json::from_str::<Config>(r#"{"operation": "diff"}"#).unwrap_err();
        assert!(err.to_string().contains("diff"));
    }
}
