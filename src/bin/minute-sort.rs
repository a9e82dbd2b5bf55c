use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};

#[derive(Parser, Debug)]
#[command(name = "minute-sort", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every game folder under a library root and summarize it.
    List(ListArgs),
    /// Prefetch items from one game folder and write the fitted images as PNGs.
    Prefetch(PrefetchArgs),
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Library root; every sub-directory is a game folder.
    #[arg(long)]
    root: PathBuf,

    /// Print the summaries as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct PrefetchArgs {
    /// Game folder containing `properties.omg` and one folder per label.
    #[arg(long)]
    game: PathBuf,

    /// Number of images to take from the buffer.
    #[arg(long)]
    count: usize,

    /// Output directory for the fitted PNGs.
    #[arg(long)]
    out: PathBuf,

    /// Lookahead size of the prefetch buffer.
    #[arg(long, default_value_t = 3)]
    target: usize,

    /// Render bounds width in pixels.
    #[arg(long, default_value_t = 640.0)]
    width: f64,

    /// Render bounds height in pixels.
    #[arg(long, default_value_t = 480.0)]
    height: f64,

    /// Seed for the shuffle (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Accept games with fewer items than the usual minimum.
    #[arg(long)]
    no_min_size: bool,
}

#[derive(Debug, serde::Serialize)]
struct GameSummary {
    folder: String,
    instructions: String,
    labels: Vec<String>,
    items: usize,
    cycle: bool,
    reshuffle_on_cycle: bool,
    correct_delta: i64,
    incorrect_delta: i64,
    time_limit_secs: u32,
}

#[derive(Debug, serde::Serialize)]
struct FailureSummary {
    folder: String,
    error: String,
}

#[derive(Debug, serde::Serialize)]
struct LibrarySummary {
    games: Vec<GameSummary>,
    failures: Vec<FailureSummary>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::List(args) => cmd_list(args),
        Command::Prefetch(args) => cmd_prefetch(args),
    }
}

fn summarize(loaded: &minute_sort::LoadedGame) -> GameSummary {
    let game = &loaded.game;
    GameSummary {
        folder: loaded.folder.display().to_string(),
        instructions: game.instructions().to_string(),
        labels: game.labels().iter().map(|l| l.name().to_string()).collect(),
        items: game.available(),
        cycle: game.does_cycle(),
        reshuffle_on_cycle: game.does_randomize(),
        correct_delta: game.correct_delta(),
        incorrect_delta: game.incorrect_delta(),
        time_limit_secs: game.time_limit_secs(),
    }
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let library = minute_sort::read_games(&args.root)
        .with_context(|| format!("load library '{}'", args.root.display()))?;

    let summary = LibrarySummary {
        games: library.games.iter().map(summarize).collect(),
        failures: library
            .failures
            .iter()
            .map(|(folder, err)| FailureSummary {
                folder: folder.display().to_string(),
                error: err.to_string(),
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for g in &summary.games {
        println!(
            "{}: {} items, labels [{}], {}s, +{}/{}{}",
            g.folder,
            g.items,
            g.labels.join(", "),
            g.time_limit_secs,
            g.correct_delta,
            g.incorrect_delta,
            match (g.cycle, g.reshuffle_on_cycle) {
                (false, _) => "",
                (true, false) => ", cycles",
                (true, true) => ", cycles (reshuffled)",
            }
        );
        println!("  {}", g.instructions);
    }
    for f in &summary.failures {
        println!("{}: FAILED: {}", f.folder, f.error);
    }
    Ok(())
}

fn cmd_prefetch(args: PrefetchArgs) -> anyhow::Result<()> {
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let loaded = minute_sort::read_game_folder_with_opts(&args.game, rng, |opts| {
        if args.no_min_size {
            opts.require_minimum_size = false;
        }
    })
    .with_context(|| format!("load game folder '{}'", args.game.display()))?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let bounds = minute_sort::Size::new(args.width, args.height);
    let center = minute_sort::Point::new(args.width / 2.0, args.height / 2.0);
    let game = Arc::new(Mutex::new(loaded.game));
    let buffer = minute_sort::PrefetchBuffer::new(args.target, game, bounds, center)?;

    let mut written = 0usize;
    while written < args.count {
        if !buffer.wait_for_size(1, Duration::from_secs(30)) {
            tracing::info!(written, "game has no more items to prefetch");
            break;
        }
        let ready = buffer.next_image()?;
        buffer.request_more();

        let out_path = output_path(&args.out, written, &ready);
        ready
            .raster
            .as_rgba()
            .save_with_format(&out_path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", out_path.display()))?;
        eprintln!(
            "wrote {} ({}x{} at {:.0},{:.0})",
            out_path.display(),
            ready.raster.width(),
            ready.raster.height(),
            ready.placement.x0,
            ready.placement.y0
        );
        written += 1;
    }

    let stats = buffer.stats();
    eprintln!(
        "prefetched {} items, skipped {}, wrote {written}",
        stats.produced, stats.failed
    );
    Ok(())
}

fn output_path(out_dir: &Path, index: usize, ready: &minute_sort::ReadyItem) -> PathBuf {
    let stem = Path::new(ready.item.display_name())
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "item".to_string());
    out_dir.join(format!("{index:03}-{}-{stem}.png", ready.item.label()))
}
