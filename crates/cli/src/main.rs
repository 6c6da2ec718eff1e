mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use personreid_core::annotation::domain::identity_palette::IdentityPalette;
use personreid_core::annotation::infrastructure::jsonl_annotation_writer::JsonlAnnotationWriter;
use personreid_core::detection::infrastructure::jsonl_detection_reader::JsonlDetectionReader;
use personreid_core::identity::domain::identity_registry::IdentityRegistry;
use personreid_core::pipeline::frame_identifier::FrameIdentifier;
use personreid_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use personreid_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use personreid_core::pipeline::pipeline_executor::PipelineExecutor;
use personreid_core::pipeline::pipeline_logger::LogPipelineLogger;
use personreid_core::pipeline::reidentify_use_case::ReidentifyUseCase;
use personreid_core::shared::constants::{DETECTIONS_EXTENSIONS, RESULTS_FILENAME};

use settings::Settings;

/// Assigns persistent person IDs to a stream of per-frame detections.
#[derive(Parser)]
#[command(name = "personreid")]
struct Cli {
    /// Detections file: one JSON object per frame with bbox + embedding per person.
    input: PathBuf,

    /// Annotations output (default: personReID_results/<timestamp>/identities.jsonl).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Cosine similarity a known identity must exceed to match (-1.0 to 1.0).
    #[arg(long)]
    threshold: Option<f64>,

    /// Seed for identity display colors.
    #[arg(long)]
    seed: Option<u64>,

    /// Read and write on background threads.
    #[arg(long)]
    threaded: bool,

    /// Settings file (JSON). Defaults to the per-user config location.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log progress every N frames.
    #[arg(long)]
    log_every: Option<usize>,
}

/// Settings merged with command-line overrides.
struct RunOptions {
    input: PathBuf,
    output: PathBuf,
    threshold: f64,
    seed: Option<u64>,
    threaded: bool,
    log_every: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.settings.as_deref())?;
    let options = resolve_options(cli, settings);
    validate(&options)?;

    let registry = IdentityRegistry::new(options.threshold);
    let palette = match options.seed {
        Some(seed) => IdentityPalette::with_seed(seed),
        None => IdentityPalette::new(),
    };
    let executor: Box<dyn PipelineExecutor> = if options.threaded {
        Box::new(ThreadedPipelineExecutor::new())
    } else {
        Box::new(SequentialPipelineExecutor::new())
    };

    let mut use_case = ReidentifyUseCase::new(
        Box::new(JsonlDetectionReader::new()),
        Box::new(JsonlAnnotationWriter::new()),
        FrameIdentifier::new(registry, palette),
        executor,
        Some(Box::new(LogPipelineLogger::new(options.log_every))),
        None,
        None,
    );

    log::info!(
        "Matching threshold {} ({} executor)",
        options.threshold,
        if options.threaded { "threaded" } else { "sequential" }
    );
    let summary = use_case.execute(&options.input, &options.output)?;
    log::info!("Output written to {}", options.output.display());
    println!(
        "{} frames, {} detections, {} identities -> {}",
        summary.frames,
        summary.detections,
        summary.identities,
        options.output.display()
    );
    Ok(())
}

fn resolve_options(cli: Cli, settings: Settings) -> RunOptions {
    let output = cli
        .output
        .unwrap_or_else(|| timestamped_output(&settings.results_root));
    RunOptions {
        input: cli.input,
        output,
        threshold: cli.threshold.unwrap_or(settings.threshold),
        seed: cli.seed.or(settings.seed),
        threaded: cli.threaded || settings.threaded,
        log_every: cli.log_every.unwrap_or(settings.log_every),
    }
}

/// `<root>/<YYYYmmdd_HHMMSS>/identities.jsonl`, one folder per run.
fn timestamped_output(root: &Path) -> PathBuf {
    let folder = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    root.join(folder).join(RESULTS_FILENAME)
}

fn validate(options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    if !options.input.exists() {
        return Err(format!("Input file not found: {}", options.input.display()).into());
    }
    if !is_detections_file(&options.input) {
        log::warn!(
            "{} does not look like a detections file (expected .{})",
            options.input.display(),
            DETECTIONS_EXTENSIONS.join(" or .")
        );
    }
    if !(-1.0..=1.0).contains(&options.threshold) {
        return Err(format!(
            "Threshold must be between -1.0 and 1.0, got {}",
            options.threshold
        )
        .into());
    }
    if options.log_every == 0 {
        return Err("Log interval must be at least 1 frame".into());
    }
    if options.output == options.input {
        return Err("Output must differ from input".into());
    }
    Ok(())
}

fn is_detections_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DETECTIONS_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["personreid"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn options(input: PathBuf) -> RunOptions {
        RunOptions {
            input,
            output: PathBuf::from("out.jsonl"),
            threshold: 0.7,
            seed: None,
            threaded: false,
            log_every: 10,
        }
    }

    #[test]
    fn test_cli_flags_override_settings() {
        let settings = Settings {
            threshold: 0.5,
            seed: Some(1),
            threaded: false,
            log_every: 7,
            results_root: PathBuf::from("results"),
        };
        let opts = resolve_options(
            cli(&["in.jsonl", "--threshold", "0.9", "--seed", "2", "--threaded"]),
            settings,
        );
        assert_eq!(opts.threshold, 0.9);
        assert_eq!(opts.seed, Some(2));
        assert!(opts.threaded);
        assert_eq!(opts.log_every, 7);
        assert!(opts.output.starts_with("results"));
        assert!(opts.output.ends_with(RESULTS_FILENAME));
    }

    #[test]
    fn test_explicit_output_used_verbatim() {
        let opts = resolve_options(
            cli(&["in.jsonl", "--output", "ids.jsonl"]),
            Settings::default(),
        );
        assert_eq!(opts.output, PathBuf::from("ids.jsonl"));
        assert_eq!(opts.threshold, 0.7);
    }

    #[test]
    fn test_validate_missing_input() {
        let err = validate(&options(PathBuf::from("/nonexistent/in.jsonl"))).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_validate_threshold_range() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jsonl");
        std::fs::write(&input, "").unwrap();

        let mut opts = options(input);
        opts.threshold = 1.5;
        let err = validate(&opts).unwrap_err();
        assert!(err.to_string().contains("Threshold"));

        opts.threshold = -1.0;
        assert!(validate(&opts).is_ok());
    }

    #[test]
    fn test_validate_log_interval() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jsonl");
        std::fs::write(&input, "").unwrap();

        let mut opts = options(input);
        opts.log_every = 0;
        assert!(validate(&opts).is_err());
    }

    #[test]
    fn test_is_detections_file() {
        assert!(is_detections_file(Path::new("a.jsonl")));
        assert!(is_detections_file(Path::new("a.NDJSON")));
        assert!(!is_detections_file(Path::new("a.mp4")));
        assert!(!is_detections_file(Path::new("a")));
    }
}
