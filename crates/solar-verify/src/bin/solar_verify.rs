//! solar-verify CLI: verify rooftop solar installations from photos.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use solar_verify::{demo, VerificationPipeline, VerificationRecord, VerifierConfig};
use std::path::PathBuf;
use std::process::ExitCode;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "solar-verify")]
#[command(about = "Verify rooftop solar installations from a photo (colour/shape panel detection)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one photo, optionally against a reference photo.
    Verify(VerifyArgs),

    /// Print (or write) the default configuration as JSON.
    DefaultConfig {
        /// Write to this path instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the synthetic demo scenes as PNG.
    Demo {
        /// Output directory.
        #[arg(long, default_value = "demo_images")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct VerifyArgs {
    /// Photo of the installation.
    image: PathBuf,

    /// Reference photo (e.g. satellite view) to compare against.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// JSON configuration; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for report images and `latest_results.json`.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Minimum confidence for approval, in [0, 1].
    #[arg(long)]
    threshold: Option<f64>,

    /// Skip writing the annotated report image.
    #[arg(long)]
    no_render: bool,

    /// Log verbosity; `RUST_LOG` takes precedence when set.
    #[arg(long, value_enum, default_value_t = LogLevelArg::Warn)]
    log_level: LogLevelArg,

    /// Emit tracing events as JSON (only with the `tracing` feature).
    #[arg(long)]
    json_trace: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Off => LevelFilter::Off,
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify(args) => run_verify(&args),
        Commands::DefaultConfig { out } => run_default_config(out).map(|_| ExitCode::SUCCESS),
        Commands::Demo { out_dir } => run_demo(out_dir).map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &VerifyArgs) {
    #[cfg(feature = "tracing")]
    {
        solar_verify::core::init_tracing(args.json_trace, args.log_level.into());
    }
    #[cfg(not(feature = "tracing"))]
    {
        if args.json_trace {
            eprintln!("warning: --json-trace needs the `tracing` feature; using plain logs");
        }
        let _ = solar_verify::core::init_with_level(args.log_level.into());
    }
}

// ── verify ─────────────────────────────────────────────────────────────

fn run_verify(args: &VerifyArgs) -> CliResult<ExitCode> {
    init_logging(args);

    let mut config = match &args.config {
        Some(path) => VerifierConfig::load_json(path)?,
        None => VerifierConfig::default(),
    };
    if let Some(dir) = &args.results_dir {
        config.output.results_dir = dir.clone();
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(format!("--threshold must lie in [0, 1], got {threshold}").into());
        }
        config.min_confidence = threshold;
    }
    if args.no_render {
        config.output.render = false;
    }

    let pipeline = VerificationPipeline::new(config);
    let record = pipeline.verify_paths(&args.image, args.reference.as_deref());
    print_summary(&record);

    let path = pipeline.persist(&record)?;
    println!("results written to {}", path.display());

    Ok(if record.is_approved() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_summary(record: &VerificationRecord) {
    println!("status:      {:?}", record.status());
    println!("verdict:     {}", record.verdict());
    println!("message:     {}", record.message());
    if record.solar_detected() {
        println!("coverage:    {:.2}%", record.coverage());
        match record.similarity() {
            Some(s) => println!("similarity:  {s:.3}"),
            None => println!("similarity:  n/a"),
        }
        println!("confidence:  {:.1}%", record.confidence() * 100.0);
        println!("panels:      {}", record.panel_count());
    }
    if let Some(path) = record.output_image_path() {
        println!("report:      {}", path.display());
    }
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config(out: Option<PathBuf>) -> CliResult<()> {
    let config = VerifierConfig::default();
    match out {
        Some(path) => {
            config.write_json(&path)?;
            println!("wrote default config to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

// ── demo ───────────────────────────────────────────────────────────────

fn run_demo(out_dir: PathBuf) -> CliResult<()> {
    let (with, without) = demo::write_demo_scenes(&out_dir)?;
    println!("wrote {}", with.display());
    println!("wrote {}", without.display());
    Ok(())
}
