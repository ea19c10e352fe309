mod test_pattern;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use vidrender_core::codec::domain::catalog::CodecCatalog;
use vidrender_core::codec::domain::codec::CodecId;
use vidrender_core::codec::domain::codec_backend::CodecBackend;
use vidrender_core::codec::domain::parameter::ParameterId;
use vidrender_core::codec::infrastructure::ffmpeg_backend::FfmpegBackend;
use vidrender_core::render::domain::render_config::RenderConfig;
use vidrender_core::render::infrastructure::worker_scheduler::WorkerScheduler;
use vidrender_core::render::render_use_case::RenderUseCase;
use vidrender_core::shared::render_properties::RenderProperties;
use vidrender_core::shared::settings::{fourcc_tag, RenderSettings};
use vidrender_core::shared::time::{seconds_to_pts, Rational};

use test_pattern::TestPatternSequence;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Codec catalog and test renders for the vidrender encode subsystem.
#[derive(Parser)]
#[command(name = "vidrender")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List output formats with their extensions and default codecs.
    Formats,
    /// List codecs and their parameters.
    Codecs,
    /// Check whether a codec can be stored in a container.
    Check {
        /// Container short name, e.g. avi.
        container: String,
        /// Codec short name, e.g. mpeg4.
        codec: String,
    },
    /// Render a synthetic colour-bar and tone sequence.
    Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Output file; its extension selects the container.
    output: PathBuf,

    /// Video codec short name, or "none" for audio only.
    #[arg(long)]
    video_codec: Option<String>,

    /// Audio codec short name, or "none" for video only.
    #[arg(long)]
    audio_codec: Option<String>,

    /// Codec parameter override, e.g. bit_rate=2000000 (repeatable).
    #[arg(long = "param", value_name = "ID=VALUE")]
    params: Vec<String>,

    /// Sequence length in seconds.
    #[arg(long, default_value = "4")]
    seconds: f64,

    /// Cut positions in frames (comma-separated).
    #[arg(long, value_delimiter = ',')]
    cuts: Vec<i64>,

    /// 1-based segment numbers that are empty gaps (comma-separated).
    #[arg(long, value_delimiter = ',')]
    gaps: Vec<usize>,

    /// Write one file per segment between cuts.
    #[arg(long)]
    separate_at_cuts: bool,

    #[arg(long, default_value = "320")]
    width: u32,

    #[arg(long, default_value = "240")]
    height: u32,

    /// Frame rate as N or N/D.
    #[arg(long, default_value = "25")]
    fps: String,

    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    #[arg(long, default_value = "2")]
    channels: u16,

    /// Codec tag forced onto the video stream, e.g. XVID.
    #[arg(long)]
    fourcc: Option<String>,

    /// Accept codecs whose support in the container is uncertain.
    #[arg(long)]
    yes: bool,

    /// Store the resulting codec choices as the default for new renders.
    #[arg(long)]
    save_default: bool,
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
    let catalog = CodecCatalog::standard();

    match cli.command {
        Command::Formats => print_formats(&catalog),
        Command::Codecs => print_codecs(&catalog),
        Command::Check { container, codec } => check(&catalog, &container, &codec)?,
        Command::Render(args) => render(&catalog, args)?,
    }
    Ok(())
}

fn print_formats(catalog: &CodecCatalog) {
    for format in catalog.formats() {
        println!(
            "{:<10} {:<12} video={:<12} audio={:<10} {}",
            format.short_name(),
            format.extensions().join(","),
            format.default_video_codec(),
            format.default_audio_codec(),
            format.long_name()
        );
    }
}

fn print_codecs(catalog: &CodecCatalog) {
    let all = catalog.video_codecs().iter().chain(catalog.audio_codecs());
    for codec in all {
        println!("{:<6} {:<12} {}", codec.kind(), codec.id(), codec.id().display_name());
        for parameter in codec.parameters() {
            let options = parameter
                .options()
                .iter()
                .map(|o| format!("{}={}", o.value, o.name))
                .collect::<Vec<_>>();
            let range = if options.is_empty() {
                format!("[{}, {}]", parameter.minimum(), parameter.maximum())
            } else {
                options.join(" ")
            };
            println!(
                "         {:<20} {} default {}",
                parameter.id().short_name(),
                range,
                parameter.default_value()
            );
        }
    }
}

fn check(
    catalog: &CodecCatalog,
    container: &str,
    codec: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = FfmpegBackend::new()?;
    let format = catalog
        .format(container)
        .ok_or_else(|| format!("Unknown container '{container}'"))?;
    let id = CodecId::from_short_name(codec).ok_or_else(|| format!("Unknown codec '{codec}'"))?;
    println!("{}", format.check_codec(&backend, id));
    Ok(())
}

fn render(catalog: &CodecCatalog, args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn CodecBackend> = Arc::new(FfmpegBackend::new()?);
    let mut settings = RenderSettings::load();
    if let Some(fourcc) = &args.fourcc {
        fourcc_tag(fourcc)?;
        settings.fourcc_override = Some(fourcc.clone());
    }

    let properties = RenderProperties {
        width: args.width,
        height: args.height,
        frame_rate: parse_rational(&args.fps)?,
        sample_rate: args.sample_rate,
        channels: args.channels,
    };
    properties.validate()?;

    let name = args
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or("Output file needs a name")?;
    let sequence = TestPatternSequence::new(
        &name,
        seconds_to_pts(args.seconds, properties.frame_rate),
        properties,
        args.cuts.clone(),
        args.gaps.clone(),
    );

    let config = build_config(catalog, backend.as_ref(), &settings, &args)?;
    log::info!("Render configuration: {}", describe(&config));
    if args.save_default {
        settings.set_default_render(&config);
        settings.save();
    }

    let scheduler = WorkerScheduler::new();
    let use_case = RenderUseCase::new(
        catalog,
        backend.clone(),
        &scheduler,
        settings.engine_settings()?,
    );
    let scheduled = use_case.schedule(&sequence, &config)?;

    while scheduler.counts().pending() > 0 {
        let (done, total) = scheduled.iter().fold((0, 0), |(d, t), job| {
            (d + job.progress.done(), t + job.progress.total())
        });
        eprint!("\rEncoding unit {done}/{total}");
        std::thread::sleep(POLL_INTERVAL);
    }
    eprintln!();

    let records = scheduler.records();
    let counts = scheduler.wait();
    for record in &records {
        match &record.result {
            Ok(report) => println!(
                "{}: {} video frames, {} audio frames",
                record.output.display(),
                report.video_frames,
                report.audio_frames
            ),
            Err(e) => println!("{}: failed: {e}", record.output.display()),
        }
    }
    if counts.failed > 0 {
        return Err(format!("{} of {} renders failed", counts.failed, counts.submitted).into());
    }
    Ok(())
}

/// Starts from the stored default, points it at the output file and applies
/// the command line codec choices.
fn build_config(
    catalog: &CodecCatalog,
    backend: &dyn CodecBackend,
    settings: &RenderSettings,
    args: &RenderArgs,
) -> Result<RenderConfig, Box<dyn std::error::Error>> {
    let default = settings.default_render(catalog);
    let dir = args
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let stem = args
        .output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut config =
        RenderConfig::seeded_for_sequence(&default, &stem, dir, &settings.default_extension);
    if config.set_output_file(args.output.clone(), catalog) {
        log::info!(
            "Output extension selects {} with its default codecs",
            config.format().short_name()
        );
    }

    if let Some(name) = &args.video_codec {
        config
            .format_mut()
            .select_video_codec(parse_codec(name)?, catalog, backend, args.yes)?;
    }
    if let Some(name) = &args.audio_codec {
        config
            .format_mut()
            .select_audio_codec(parse_codec(name)?, catalog, backend, args.yes)?;
    }

    for param in &args.params {
        let (id, value) = parse_param(param)?;
        let format = config.format_mut();
        if format.video_codec().parameter(id).is_some() {
            format.video_codec_mut().set_parameter_value(id, value)?;
        } else {
            format.audio_codec_mut().set_parameter_value(id, value)?;
        }
    }

    config.set_separate_at_cuts(args.separate_at_cuts);
    Ok(config)
}

fn describe(config: &RenderConfig) -> String {
    let format = config.format();
    format!(
        "{} [{}] [{}]{}",
        format.short_name(),
        format.video_codec(),
        format.audio_codec(),
        if config.separate_at_cuts() {
            " separate at cuts"
        } else {
            ""
        }
    )
}

fn parse_codec(name: &str) -> Result<CodecId, String> {
    CodecId::from_short_name(name).ok_or_else(|| format!("Unknown codec '{name}'"))
}

fn parse_param(param: &str) -> Result<(ParameterId, i32), String> {
    let (id, value) = param
        .split_once('=')
        .ok_or_else(|| format!("Parameter must be ID=VALUE, got '{param}'"))?;
    let id = ParameterId::from_short_name(id.trim())
        .ok_or_else(|| format!("Unknown parameter '{id}'"))?;
    let value = value
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("Invalid value for {id}: {e}"))?;
    Ok((id, value))
}

fn parse_rational(value: &str) -> Result<Rational, String> {
    let (num, den) = value.split_once('/').unwrap_or((value, "1"));
    let parse = |s: &str| {
        s.trim()
            .parse::<i32>()
            .map_err(|e| format!("Invalid frame rate '{value}': {e}"))
    };
    let rate = Rational::new(parse(num)?, parse(den)?);
    if !rate.is_positive() {
        return Err(format!("Frame rate must be positive, got '{value}'"));
    }
    Ok(rate)
}
