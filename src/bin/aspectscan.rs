use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use aspectscan::{
    FfmpegEstimator, FfmpegLogLevel, FilterOptions, FilterReport, FrameSelection, OperationType,
    PassSummary, PipelineConfig, ProgressCallback, ProgressInfo, RatioEstimator, batch, filter,
    histogram::DEFAULT_BINS,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  aspectscan measure v_Archery_x1.mp4 --json\n  aspectscan --dataset-root /data/HACS/training --working-dir work scan --progress\n  aspectscan --working-dir work filter --histograms plots\n  aspectscan --dataset-root /data/HACS/training --working-dir work run\n  aspectscan --max-frames 25 measure v_Archery_x1.mp4\n  aspectscan completions zsh > _aspectscan";

const PROGRESS_TEMPLATE: &str = "{spinner:.green} {prefix} {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}";

#[derive(Debug, Parser)]
#[command(
    name = "aspectscan",
    version,
    about = "Measure frame and content aspect ratios of video clips and filter out bordered ones",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
    /// Root of the `{class}/{video}` tree of raw videos.
    #[arg(long, global = true, default_value = ".")]
    dataset_root: PathBuf,

    /// Directory holding duration.csv, dataset.csv, the failure log and the filtered table.
    #[arg(long, global = true, default_value = ".")]
    working_dir: PathBuf,

    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar during the passes.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Only look for content in the first N frames of each video.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    max_frames: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure the frame and crop ratios of one video.
    #[command(
        about = "Measure one video",
        after_help = "Examples:\n  aspectscan measure clip.mp4\n  aspectscan measure clip.mp4 --json"
    )]
    Measure {
        /// Video file path.
        video: PathBuf,

        /// Output the measurement as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Measure every qualifying video of the duration table.
    #[command(about = "Run the first pass")]
    Scan,

    /// Re-measure the videos named in the failure log.
    #[command(about = "Run the repair pass")]
    Repair,

    /// Select videos with a normal frame ratio and no black border.
    #[command(
        about = "Filter the dataset table",
        after_help = "Examples:\n  aspectscan --working-dir work filter\n  aspectscan --working-dir work filter --out selected.csv --histograms plots --bins 20"
    )]
    Filter {
        #[command(flatten)]
        options: FilterArgs,
    },

    /// Scan, repair and filter in one go.
    #[command(about = "Run the whole pipeline")]
    Run {
        #[command(flatten)]
        options: FilterArgs,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Parser, Clone)]
struct FilterArgs {
    /// Output path for the selected rows (default: filtered.csv in the working directory).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory for frame_ratio_hist.png and crop_ratio_hist.png.
    #[arg(long)]
    histograms: Option<PathBuf>,

    /// Number of histogram bins.
    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,

    /// Output the filter report as JSON.
    #[arg(long)]
    json: bool,
}

impl FilterArgs {
    fn to_options(&self) -> FilterOptions {
        FilterOptions {
            bins: self.bins,
            histogram_dir: self.histograms.clone(),
            output: self.out.clone(),
        }
    }
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        LevelFilter::Debug
    } else if global.progress {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            let level = match record.level() {
                log::Level::Error => "ERROR".bright_red(),
                log::Level::Warn => "WARN ".yellow(),
                log::Level::Info => "INFO ".green(),
                log::Level::Debug => "DEBUG".blue(),
                log::Level::Trace => "TRACE".magenta(),
            };
            writeln!(
                buf,
                "{} {} {}",
                timestamp.to_string().white(),
                level,
                record.args()
            )
        })
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        aspectscan::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn pipeline_config(global: &GlobalOptions) -> PipelineConfig {
    let config = PipelineConfig::new(&global.dataset_root, &global.working_dir);
    if global.progress {
        config.with_progress(Arc::new(TerminalProgress::default()))
    } else {
        config
    }
}

/// Draws one `indicatif` bar per pass.
#[derive(Default)]
struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

fn estimator(global: &GlobalOptions) -> FfmpegEstimator {
    match global.max_frames {
        Some(count) => FfmpegEstimator::new().with_selection(FrameSelection::first(count)),
        None => FfmpegEstimator::new(),
    }
}

fn operation_label(operation: OperationType) -> &'static str {
    match operation {
        OperationType::FirstPass => "scan",
        OperationType::RepairPass => "repair",
        _ => "pass",
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(info.total);
            if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
                bar.set_style(style.progress_chars("##-"));
            }
            bar.set_prefix(operation_label(info.operation));
            bar
        });

        bar.set_position(info.current);
        if info.succeeded {
            bar.set_message(info.video.clone());
        } else {
            bar.set_message(format!("{} {}", "failed".red(), info.video));
        }

        if info.current >= info.total {
            bar.finish_and_clear();
            *slot = None;
        }
    }
}

fn print_pass_summary(name: &str, summary: &PassSummary, table: &Path) {
    println!(
        "{} {} processed, {} succeeded, {} failed, {} rows updated",
        format!("{name}:").cyan().bold(),
        summary.processed,
        summary.succeeded.to_string().green(),
        if summary.failed > 0 {
            summary.failed.to_string().red()
        } else {
            summary.failed.to_string().normal()
        },
        summary.rows_updated
    );
    println!("{} {}", "table:".cyan().bold(), table.display());
}

fn print_filter_report(report: &FilterReport, json: bool) {
    let outcome = &report.outcome;
    if json {
        let histograms: Vec<_> = [&report.frame_histogram, &report.crop_histogram]
            .iter()
            .map(|histogram| {
                json!({
                    "name": histogram.name,
                    "lower": histogram.lower,
                    "upper": histogram.upper,
                    "counts": histogram.counts,
                })
            })
            .collect();
        let payload = json!({
            "window": {
                "mean": outcome.window.mean,
                "std_dev": outcome.window.std_dev,
                "lower": outcome.window.lower,
                "upper": outcome.window.upper,
            },
            "selected": outcome.selected.len(),
            "outliers": outcome.outliers,
            "mismatched": outcome.mismatched,
            "output": report.output.display().to_string(),
            "histograms": histograms,
        });
        println!("{payload:#}");
        return;
    }

    print!("{}", report.frame_histogram);
    print!("{}", report.crop_histogram);
    println!(
        "{} mean {:.4}, std {:.4}, window [{:.4}, {:.4}]",
        "frame ratio:".cyan().bold(),
        outcome.window.mean,
        outcome.window.std_dev,
        outcome.window.lower,
        outcome.window.upper
    );
    println!(
        "{} {} kept, {} outside the window, {} with black borders",
        "filter:".cyan().bold(),
        outcome.selected.len().to_string().green(),
        outcome.outliers,
        outcome.mismatched
    );
    println!("{} {}", "table:".cyan().bold(), report.output.display());
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Measure { video, json } => {
            let estimate = estimator(&cli.global).estimate(&video)?;
            if json {
                let payload = json!({
                    "video": video.display().to_string(),
                    "width": estimate.frame_size.0,
                    "height": estimate.frame_size.1,
                    "frame_ratio": estimate.ratios.frame_ratio.value(),
                    "crop_ratio": estimate.ratios.crop_ratio.value(),
                    "frame_index": estimate.frame_index,
                    "crop": {
                        "left": estimate.crop.left,
                        "top": estimate.crop.top,
                        "right": estimate.crop.right,
                        "bottom": estimate.crop.bottom,
                    },
                    "bordered": !estimate.ratios.is_consistent(),
                });
                println!("{payload:#}");
            } else {
                println!("{} {}", "video:".cyan().bold(), video.display());
                println!(
                    "{} {} ({}x{})",
                    "frame ratio:".cyan().bold(),
                    estimate.ratios.frame_ratio,
                    estimate.frame_size.0,
                    estimate.frame_size.1
                );
                println!(
                    "{} {} ({}x{} from frame {})",
                    "crop ratio:".cyan().bold(),
                    estimate.ratios.crop_ratio,
                    estimate.crop.width(),
                    estimate.crop.height(),
                    estimate.frame_index + 1
                );
                if !estimate.ratios.is_consistent() {
                    println!("{}", "content does not fill the frame".yellow());
                }
            }
        }

        Commands::Scan => {
            let config = pipeline_config(&cli.global);
            let summary = batch::run_first_pass(&config, &mut estimator(&cli.global))?;
            print_pass_summary("scan", &summary, &config.dataset_path());
        }

        Commands::Repair => {
            let config = pipeline_config(&cli.global);
            let summary = batch::run_repair_pass(&config, &mut estimator(&cli.global))?;
            print_pass_summary("repair", &summary, &config.dataset_path());
        }

        Commands::Filter { options } => {
            let config = pipeline_config(&cli.global);
            let report = filter::run_filter(&config, &options.to_options())?;
            print_filter_report(&report, options.json);
        }

        Commands::Run { options } => {
            let config = pipeline_config(&cli.global);
            let mut ratio_estimator = estimator(&cli.global);

            let summary = batch::run_first_pass(&config, &mut ratio_estimator)?;
            print_pass_summary("scan", &summary, &config.dataset_path());
            let summary = batch::run_repair_pass(&config, &mut ratio_estimator)?;
            print_pass_summary("repair", &summary, &config.dataset_path());

            let report = filter::run_filter(&config, &options.to_options())?;
            print_filter_report(&report, options.json);
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "aspectscan", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use indicatif::ProgressStyle;

    use aspectscan::FrameSelection;

    use super::{Cli, Commands, PROGRESS_TEMPLATE, estimator};

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn progress_template_parses() {
        assert!(ProgressStyle::with_template(PROGRESS_TEMPLATE).is_ok());
    }

    #[test]
    fn global_options_precede_subcommand() {
        let cli = Cli::try_parse_from([
            "aspectscan",
            "--dataset-root",
            "/data/HACS/training",
            "--working-dir",
            "work",
            "--progress",
            "scan",
        ])
        .unwrap();
        assert_eq!(cli.global.dataset_root.to_str(), Some("/data/HACS/training"));
        assert!(cli.global.progress);
        assert!(matches!(cli.command, Commands::Scan));
    }

    #[test]
    fn global_options_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "aspectscan",
            "--dataset-root",
            "/data/HACS/training",
            "--working-dir",
            "work",
            "scan",
            "--progress",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.global.progress);
        assert!(cli.global.verbose);
        assert_eq!(cli.global.working_dir.to_str(), Some("work"));
        assert!(matches!(cli.command, Commands::Scan));
    }

    #[test]
    fn help_examples_parse() {
        for line in super::CLI_AFTER_HELP.lines().skip(1) {
            let command_line = line.split('>').next().unwrap_or(line);
            let arguments: Vec<&str> = command_line.split_whitespace().collect();
            assert!(Cli::try_parse_from(arguments).is_ok(), "{line}");
        }
    }

    #[test]
    fn max_frames_limits_candidates() {
        let cli = Cli::try_parse_from(["aspectscan", "measure", "clip.mp4", "--max-frames", "25"])
            .unwrap();
        assert_eq!(cli.global.max_frames, Some(25));
        assert_eq!(estimator(&cli.global).selection(), FrameSelection::Range(0, 24));
        assert!(Cli::try_parse_from(["aspectscan", "--max-frames", "0", "scan"]).is_err());
    }

    #[test]
    fn filter_defaults_to_ten_bins() {
        let cli = Cli::try_parse_from(["aspectscan", "filter", "--histograms", "plots"]).unwrap();
        match cli.command {
            Commands::Filter { options } => {
                assert_eq!(options.bins, 10);
                assert_eq!(options.histograms.as_deref().and_then(|p| p.to_str()), Some("plots"));
                assert!(options.out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn measure_requires_a_video() {
        assert!(Cli::try_parse_from(["aspectscan", "measure"]).is_err());
    }
}
