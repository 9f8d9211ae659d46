use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framescan::{
    Analysis, Analyzer, ConfidenceStyle, FfmpegLogLevel, FrameSource, OperationType,
    PipelineConfig, PlaceholderDetector, ProgressCallback, ProgressInfo, VideoFile, report,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framescan metadata input.mp4 --json\n  framescan analyze input.mp4 --stride 5 --csv frames.csv --json frames.json --progress\n  framescan sample input.mov --out frames --stride 30 --ext jpg\n  framescan completions zsh > _framescan";

/// How many report rows are echoed to the terminal.
const TERMINAL_ROWS: usize = 10;

#[derive(Debug, Parser)]
#[command(
    name = "framescan",
    version,
    about = "Sample video frames, tag objects, and export CSV/JSON reports",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while decoding.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framescan metadata input.mp4\n  framescan metadata input.mkv --json"
    )]
    Metadata {
        /// Input video (.mp4, .avi, .mov, .mkv).
        input: PathBuf,

        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample frames, tag them, and write reports.
    #[command(
        about = "Analyze a video and export reports",
        after_help = "Examples:\n  framescan analyze input.mp4 --csv frames.csv\n  framescan analyze input.mp4 --stride 10 --group-size 5 --threshold 0.7 --json frames.json --percent"
    )]
    Analyze {
        /// Input video (.mp4, .avi, .mov, .mkv).
        input: PathBuf,
        /// Keep every Nth frame.
        #[arg(long, default_value_t = 5)]
        stride: u64,
        /// Sampled frames per segment.
        #[arg(long, default_value_t = 10)]
        group_size: u64,
        /// Minimum confidence (0..=1) for a detection to be counted.
        #[arg(long, default_value_t = 0.5)]
        threshold: f32,
        /// Only report the first N sampled frames.
        #[arg(long)]
        rows: Option<usize>,
        /// Write the extended CSV report here.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the basic Frame,Objects CSV here.
        #[arg(long)]
        basic_csv: Option<PathBuf>,
        /// Write the JSON report here.
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write confidences as percentages instead of fractions.
        #[arg(long)]
        percent: bool,
        /// Save preview frames into this directory.
        #[arg(long)]
        frames_out: Option<PathBuf>,
        /// Print the whole analysis as JSON instead of a text summary.
        #[arg(long)]
        summary_json: bool,
        /// Seed for the placeholder detector.
        #[arg(long, default_value_t = 0x5EED)]
        seed: u64,
    },

    /// Save every Nth frame as an image.
    #[command(
        about = "Save sampled frames",
        after_help = "Examples:\n  framescan sample input.mp4 --out frames --stride 30\n  framescan sample input.mkv --out frames --ext jpg"
    )]
    Sample {
        /// Input video (.mp4, .avi, .mov, .mkv).
        input: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Keep every Nth frame.
        #[arg(long, default_value_t = 5)]
        stride: u64,
        /// Image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_image_extension(value: &str) -> Option<String> {
    let clean = value.trim_start_matches('.').to_ascii_lowercase();
    match clean.as_str() {
        "png" | "jpg" | "jpeg" | "bmp" | "tiff" => Some(clean),
        _ => None,
    }
}

fn confidence_style(percent: bool) -> ConfidenceStyle {
    if percent {
        ConfidenceStyle::Percent
    } else {
        ConfidenceStyle::Fraction
    }
}

fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn validate_analyze_options(
    stride: u64,
    group_size: u64,
    threshold: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    if stride == 0 {
        return Err("--stride must be greater than 0".into());
    }
    if group_size == 0 {
        return Err("--group-size must be greater than 0".into());
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("--threshold must be within 0..=1 (got {threshold})").into());
    }
    Ok(())
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn check_output_dir(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if !overwrite {
            return Err(format!(
                "output directory already exists: {} (use --overwrite)",
                path.display()
            )
            .into());
        }
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("writing into existing directory {}", path.display()).yellow()
        );
    }
    Ok(())
}

fn prepare_output_dir(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    check_output_dir(path, overwrite)?;
    fs::create_dir_all(path)?;
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(global.verbose)),
    )
    .init();

    if let Some(level) = &global.log_level {
        let parsed = FfmpegLogLevel::from_name(level)
            .ok_or(format!("unsupported --log-level: {level}"))?;
        framescan::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

/// Drives an indicatif bar from sampling progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.operation != OperationType::Sampling {
            return;
        }
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
    }
}

fn print_analysis(analysis: &Analysis) {
    let metadata = &analysis.metadata;
    println!(
        "Total frames: {}   FPS: {:.1}   Duration: {:.1}s   Sample rate: 1/{}",
        analysis.decoded_frames,
        metadata.frames_per_second,
        analysis.duration().as_secs_f64(),
        analysis.sample_stride,
    );
    println!(
        "Sampled {} frames from {} total frames",
        analysis.sampled_indices.len(),
        analysis.decoded_frames
    );

    println!();
    println!("{} ({})", "Segments".bold(), analysis.provenance);
    for segment in &analysis.segments {
        println!(
            "  #{:<3} frames {:>7}..{:<7} {:>7.2}s  objects {}",
            segment.id,
            segment.start_frame,
            segment.end_frame,
            segment.duration.as_secs_f64(),
            segment.estimated_objects,
        );
    }

    println!();
    println!(
        "{} ({}, first {} of {})",
        "Objects per frame".bold(),
        analysis.provenance,
        analysis.rows.len().min(TERMINAL_ROWS),
        analysis.rows.len()
    );
    println!("  {:>8}  {:>7}  {:<12}  {}", "Frame", "Objects", "Class", "Confidence");
    for row in analysis.rows.iter().take(TERMINAL_ROWS) {
        println!(
            "  {:>8}  {:>7}  {:<12}  {}",
            row.frame_index,
            row.object_count,
            row.primary_class,
            row.confidence
                .map(|confidence| confidence.to_percent_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

/// Write a report file. Callers check for existing files up front.
fn write_artifact(path: &Path, contents: &str) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, contents)?;
    println!("{} {}", "saved".green().bold(), path.display());
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Metadata { input, json } => {
            let mut video = VideoFile::open(&input)?;
            let metadata = video.metadata().clone();
            video.close();

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration().as_secs_f64(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec
                );
                println!("Frames: {}", metadata.frame_count);
                println!("Duration: {:.2}s", metadata.duration().as_secs_f64());
            }
        }
        Commands::Analyze {
            input,
            stride,
            group_size,
            threshold,
            rows,
            csv,
            basic_csv,
            json,
            percent,
            frames_out,
            summary_json,
            seed,
        } => {
            validate_analyze_options(stride, group_size, threshold)?;
            let style = confidence_style(percent);

            // Fail on existing outputs before spending time decoding.
            for path in [&csv, &basic_csv, &json].into_iter().flatten() {
                ensure_writable_path(path, cli.global.overwrite)?;
            }
            if let Some(directory) = &frames_out {
                check_output_dir(directory, cli.global.overwrite)?;
            }

            let mut config = PipelineConfig::new()
                .with_sample_stride(stride)
                .with_scene_group_size(group_size)
                .with_confidence_threshold(threshold)
                .with_max_report_rows(rows)
                .with_batch_size(25);

            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                config = config.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let mut analyzer = Analyzer::new(config, PlaceholderDetector::new(seed));
            let analysis = analyzer.analyze_file(&input)?;

            if let Some(progress) = progress {
                progress.bar.finish_with_message("done");
            }

            if summary_json {
                println!("{}", analysis.summary_json(style)?);
            } else {
                print_analysis(&analysis);
            }

            if let Some(path) = &csv {
                write_artifact(path, &report::to_csv(&analysis.rows, style)?)?;
            }
            if let Some(path) = &basic_csv {
                write_artifact(path, &report::to_basic_csv(&analysis.rows)?)?;
            }
            if let Some(path) = &json {
                write_artifact(path, &report::to_json(&analysis.rows, style)?)?;
            }

            if let Some(directory) = frames_out {
                fs::create_dir_all(&directory)?;
                for frame in &analysis.previews {
                    let output_path = directory.join(format!("frame_{:06}.png", frame.index));
                    frame.image.save(&output_path)?;
                    if cli.global.verbose {
                        eprintln!("saved frame {} -> {}", frame.index, output_path.display());
                    }
                }
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Saved {} preview frame(s) to {}",
                        analysis.previews.len(),
                        directory.display()
                    )
                    .green()
                );
            }
        }
        Commands::Sample {
            input,
            out,
            stride,
            ext,
        } => {
            if stride == 0 {
                return Err("--stride must be greater than 0".into());
            }
            let ext = parse_image_extension(&ext)
                .ok_or(format!("unsupported --ext: {ext} (png, jpg, jpeg, bmp, tiff)"))?;

            let mut video = VideoFile::open(&input)?;
            prepare_output_dir(&out, cli.global.overwrite)?;

            let progress_bar = if cli.global.progress {
                let bar = ProgressBar::new(video.metadata().frame_count.div_ceil(stride));
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                Some(bar)
            } else {
                None
            };

            let mut saved = 0_u64;
            for frame in framescan::sample(&mut video, stride)? {
                let frame = frame?;
                let output_path = out.join(format!("frame_{:06}.{ext}", frame.index));
                if output_path.exists() && !cli.global.overwrite {
                    return Err(format!(
                        "output file already exists: {} (use --overwrite)",
                        output_path.display()
                    )
                    .into());
                }
                frame.image.save(&output_path)?;
                saved += 1;

                if let Some(bar) = &progress_bar {
                    bar.inc(1);
                }
                if cli.global.verbose {
                    eprintln!("saved frame {} -> {}", frame.index, output_path.display());
                }
            }
            video.close();

            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Saved {saved} frame(s) to {}", out.display()).green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framescan", &mut std::io::stdout());
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
    use clap::CommandFactory;
    use framescan::ConfidenceStyle;

    use super::{
        Cli, check_output_dir, confidence_style, default_log_filter, ensure_writable_path,
        parse_image_extension, validate_analyze_options,
    };

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_image_extension_aliases() {
        assert_eq!(parse_image_extension("png").as_deref(), Some("png"));
        assert_eq!(parse_image_extension(".JPG").as_deref(), Some("jpg"));
        assert_eq!(parse_image_extension("tiff").as_deref(), Some("tiff"));
        assert!(parse_image_extension("gif").is_none());
    }

    #[test]
    fn confidence_style_from_flag() {
        assert_eq!(confidence_style(true), ConfidenceStyle::Percent);
        assert_eq!(confidence_style(false), ConfidenceStyle::Fraction);
    }

    #[test]
    fn verbose_raises_log_filter() {
        assert_eq!(default_log_filter(true), "debug");
        assert_eq!(default_log_filter(false), "warn");
    }

    #[test]
    fn analyze_options_are_checked() {
        assert!(validate_analyze_options(5, 10, 0.5).is_ok());
        assert!(validate_analyze_options(0, 10, 0.5).is_err());
        assert!(validate_analyze_options(5, 0, 0.5).is_err());
        assert!(validate_analyze_options(5, 10, 1.5).is_err());
        assert!(validate_analyze_options(5, 10, f32::NAN).is_err());
    }

    #[test]
    fn existing_outputs_need_overwrite() {
        let directory = tempfile::tempdir().expect("temp dir");
        let report = directory.path().join("frames.csv");
        std::fs::write(&report, "Frame,Objects\n").expect("write");

        assert!(check_output_dir(directory.path(), false).is_err());
        assert!(check_output_dir(directory.path(), true).is_ok());
        assert!(ensure_writable_path(&report, false).is_err());
        assert!(ensure_writable_path(&report, true).is_ok());

        let fresh = directory.path().join("previews");
        assert!(check_output_dir(&fresh, false).is_ok());
        assert!(!fresh.exists(), "checking must not create the directory");
        assert!(ensure_writable_path(&directory.path().join("new.json"), false).is_ok());
    }
}
