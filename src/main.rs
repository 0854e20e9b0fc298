use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};

use showreel::{
    config::Config,
    content::{gallery_locators, video_source, ContentCache, ContentFetcher, JsonFileSource},
    gallery::{probe_all, ImageFileProbe, Masonry},
    sequencer::{event_queue, follow_plays, AutoplayGate, SequencerDriver, SimulatedMedia, VideoSource},
};

#[derive(Parser)]
#[command(
    name = "showreel",
    version,
    about = "Background video sequencing and masonry gallery layout",
    long_about = "Showreel drives the looping background video and the photo gallery of a film production portfolio site. The CLI lays out image folders, dry-runs clip sequences and inspects CMS exports."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe images and print the balanced masonry columns
    Layout {
        /// Image files or directories of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Viewport width in pixels
        #[arg(short, long, default_value_t = 1280)]
        width: u32,
    },

    /// Run the sequencer over simulated clips and log each activation
    Play {
        /// Clip locators in play order
        #[arg(required = true)]
        locators: Vec<String>,

        /// Length of every simulated clip in seconds
        #[arg(long, default_value_t = 4.0)]
        clip_seconds: f64,

        /// Full passes through the list before stopping
        #[arg(long, default_value_t = 1)]
        cycles: usize,

        /// Index of the first clip
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Reject autoplay until a simulated click one second in
        #[arg(long)]
        blocked_autoplay: bool,
    },

    /// Load a CMS export and print the derived locators
    Content {
        /// Content type, e.g. director, music, photo
        content_type: String,

        /// Export directory (overrides content.export_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Showreel v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    match cli.command {
        Command::Layout { paths, width } => run_layout(&config, &paths, width).await,
        Command::Play {
            locators,
            clip_seconds,
            cycles,
            start,
            blocked_autoplay,
        } => {
            let source = VideoSource::from_locators(locators);
            run_play(&config, source, clip_seconds, cycles, start, blocked_autoplay).await
        }
        Command::Content { content_type, dir } => run_content(&config, &content_type, dir),
    }
}

async fn run_layout(config: &Config, paths: &[PathBuf], width: u32) -> Result<()> {
    let images = collect_images(paths)?;
    info!("Laying out {} images at {}px", images.len(), width);

    let mut masonry = Masonry::new(config.gallery.clone(), width);
    masonry.set_images(images.iter().map(|p| p.display().to_string()));

    let failed = probe_all(Arc::new(ImageFileProbe::new()), &mut masonry).await;
    if failed > 0 {
        warn!("{} images could not be measured and were laid out as squares", failed);
    }

    for (column, placed) in masonry.assignment().columns().iter().enumerate() {
        println!("column {}", column);
        for image in placed {
            let ratio = masonry.images()[image.original_index]
                .ratio_or(config.gallery.fallback_ratio);
            println!("  {:>3}  {:.3}  {}", image.original_index, ratio, image.locator);
        }
    }
    Ok(())
}

/// Expand directories into their image files, sorted by name
fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("reading {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_image(p))
                .collect();
            found.sort();
            images.extend(found);
        } else {
            images.push(path.clone());
        }
    }
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("jpg" | "jpeg" | "png" | "webp" | "avif")
    )
}

async fn run_play(
    config: &Config,
    source: VideoSource,
    clip_seconds: f64,
    cycles: usize,
    start: usize,
    blocked_autoplay: bool,
) -> Result<()> {
    if !clip_seconds.is_finite() || clip_seconds <= 0.0 {
        anyhow::bail!("--clip-seconds must be positive, got {}", clip_seconds);
    }

    let gate = if blocked_autoplay { AutoplayGate::blocked() } else { AutoplayGate::open() };
    let (handle, queue) = event_queue();
    let length = Duration::from_secs_f64(clip_seconds);
    let media: Vec<SimulatedMedia> = source
        .iter()
        .enumerate()
        .map(|(i, clip)| SimulatedMedia::new(i, clip.clone(), length, gate.clone(), handle.clone()))
        .collect();

    let driver = SequencerDriver::new(media, &config.sequencer, handle.clone(), queue);
    let mut state = driver.subscribe();
    let task = tokio::spawn(driver.run(start));

    if blocked_autoplay {
        let gate = gate.clone();
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            info!("Simulating a click on the page");
            gate.allow();
            handle.user_gesture();
        });
    }

    let target = (cycles * source.len()) as u64;
    let completed = follow_plays(&mut state, target, |index| {
        if let Some(clip) = source.get(index) {
            println!("{:>3}  {}", index, clip.locator);
        }
    })
    .await;
    if !completed {
        warn!("Sequencer parked; stopping early");
    }

    handle.stop();
    task.await.context("sequencer task panicked")??;
    Ok(())
}

fn run_content(config: &Config, content_type: &str, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir
        .or_else(|| config.content.export_dir.clone())
        .context("no export directory; pass --dir or set content.export_dir")?;

    let fetcher = ContentFetcher::new(
        JsonFileSource::new(dir),
        ContentCache::new(config.content.cache_ttl()),
    );
    let items = fetcher.fetch(content_type);
    if items.is_empty() {
        println!("No '{}' content yet", content_type);
        return Ok(());
    }

    for item in &items {
        println!("{}  {}", item.id, item.title);
    }

    let videos = video_source(&items);
    let images = gallery_locators(&items);
    println!("{} background clips, {} gallery images", videos.len(), images.len());
    for clip in videos.iter() {
        println!("  video  {}", clip.locator);
    }
    for image in &images {
        println!("  image  {}", image);
    }
    Ok(())
}
