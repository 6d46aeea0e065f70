use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use spreadmap::{
    BackgroundOpts, Canvas, CpuRenderer, DatasetVariant, FetchOpts, FetchOutcome, Fetcher,
    FrameIndex, PngDirSink, RenderSession, RendererOpts, load_variant,
};

#[derive(Parser, Debug)]
#[command(name = "spreadmap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the case tables, then render every missing frame.
    Run(RunArgs),
    /// Only fetch the case tables into the data directory.
    Fetch(FetchArgs),
    /// Render a single frame as a PNG, ignoring the frame cache.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Local cache directory for the CSV tables.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// URL prefix of the time-series tables.
    #[arg(long, default_value = spreadmap::data::fetch::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Equirectangular world image drawn under the markers. Without it (or --coastlines) the map
    /// is a plain ocean rectangle with no land.
    #[arg(long)]
    background: Option<PathBuf>,

    /// GeoJSON coastlines stroked over the background.
    #[arg(long)]
    coastlines: Option<PathBuf>,

    /// Extra directory of .ttf/.otf fonts.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    render: RenderArgs,

    /// Use the cached tables without downloading.
    #[arg(long, default_value_t = false)]
    skip_fetch: bool,

    /// Directory the `frames/<variant>` folders are created in.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Variant to render (repeatable). Defaults to confirmed and active.
    #[arg(long = "variant", value_enum)]
    variants: Vec<VariantChoice>,

    /// Print per-variant statistics as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Local cache directory for the CSV tables.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(flatten)]
    render: RenderArgs,

    /// Variant to render.
    #[arg(long, value_enum, default_value_t = VariantChoice::Confirmed)]
    variant: VariantChoice,

    /// Date column index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Confirmed,
    Active,
    Deaths,
}

impl From<VariantChoice> for DatasetVariant {
    fn from(v: VariantChoice) -> Self {
        match v {
            VariantChoice::Confirmed => DatasetVariant::Confirmed,
            VariantChoice::Active => DatasetVariant::Active,
            VariantChoice::Deaths => DatasetVariant::Deaths,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Fetch(args) => cmd_fetch(&args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_fetch(args: &FetchArgs) -> anyhow::Result<()> {
    let fetcher = Fetcher::new(FetchOpts {
        base_url: args.base_url.clone(),
        data_dir: args.data_dir.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
    })?;
    for (file, outcome) in fetcher.fetch_all()? {
        match outcome {
            FetchOutcome::Downloaded { bytes } => {
                tracing::info!(file = file.file_name(), bytes, "downloaded");
            }
            FetchOutcome::KeptCached { .. } => {
                tracing::info!(file = file.file_name(), "using cached copy");
            }
            FetchOutcome::Missing { reason } => {
                tracing::error!(
                    file = file.file_name(),
                    reason = reason.as_str(),
                    "table unavailable"
                );
            }
        }
    }
    Ok(())
}

fn make_renderer(args: &RenderArgs) -> anyhow::Result<CpuRenderer> {
    let opts = RendererOpts {
        canvas: Canvas::new(args.width, args.height)?,
        background: BackgroundOpts {
            raster: args.background.clone(),
            coastlines: args.coastlines.clone(),
            ..BackgroundOpts::default()
        },
        fonts_dir: args.fonts_dir.clone(),
        ..RendererOpts::default()
    };
    Ok(CpuRenderer::new(opts)?)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    if args.skip_fetch {
        tracing::info!(
            dir = %args.fetch.data_dir.display(),
            "skipping fetch, using cached tables"
        );
    } else {
        cmd_fetch(&args.fetch)?;
    }

    let variants: Vec<DatasetVariant> = if args.variants.is_empty() {
        DatasetVariant::DEFAULT_SET.to_vec()
    } else {
        args.variants.iter().map(|&v| v.into()).collect()
    };

    let mut renderer = make_renderer(&args.render)?;
    let mut report = serde_json::Map::new();
    for variant in variants {
        tracing::info!("processing {} cases", variant.name());
        let table = load_variant(variant, &args.fetch.data_dir)
            .with_context(|| format!("load {} table", variant.name()))?;
        let config = variant.config();
        let mut sink = PngDirSink::new(args.out_dir.join(&config.frames_dir));

        let mut session = RenderSession::new(&table, &config, &mut renderer);
        let stats = session.render_all(&mut sink)?;
        tracing::info!(
            variant = variant.name(),
            total = stats.frames_total,
            rendered = stats.frames_rendered,
            skipped = stats.frames_skipped,
            dir = %sink.dir().display(),
            "variant done"
        );
        report.insert(variant.name().to_owned(), serde_json::to_value(stats)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let variant: DatasetVariant = args.variant.into();
    let table = load_variant(variant, &args.data_dir)
        .with_context(|| format!("load {} table", variant.name()))?;
    let config = variant.config();
    let mut renderer = make_renderer(&args.render)?;

    let frame =
        RenderSession::new(&table, &config, &mut renderer).render_frame(FrameIndex(args.index))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
