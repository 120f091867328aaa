//! Binary entrypoint for the self-healing slideshow.
//!
//! Wires the loader and viewer tasks together; all logic lives in the
//! library crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use erratica::events::{InvalidSlide, LoadSlide, SlideCommand, SlideLoaded};
use erratica::render::sink::PngSequenceSink;
use erratica::slides::SlideShow;
use erratica::tasks::viewer::ViewerOptions;

#[derive(Debug, Parser)]
#[command(name = "erratica", about = "Self-healing slideshow renderer")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override the slides directory from the config
    #[arg(long, value_name = "DIR")]
    slides: Option<PathBuf>,

    /// Directory the PNG frame sequence is written to
    #[arg(short, long, value_name = "DIR", default_value = "frames")]
    out: PathBuf,

    /// Stop after rendering this many frames
    #[arg(long, value_name = "COUNT")]
    frames: Option<u64>,

    /// Override the deterministic seed from the config
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("erratica={level}").parse().expect("valid directive"));
    fmt().with_env_filter(filter).with_target(true).init();
}

/// Map stdin lines to navigation: `n` next, `p` prev, `q` quit.
async fn run_stdin_commands(
    command_tx: mpsc::Sender<SlideCommand>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim() {
                    "n" | "next" => {
                        if command_tx.send(SlideCommand::Next).await.is_err() {
                            break;
                        }
                    }
                    "p" | "prev" => {
                        if command_tx.send(SlideCommand::Prev).await.is_err() {
                            break;
                        }
                    }
                    "q" | "quit" => {
                        cancel.cancel();
                        break;
                    }
                    other => {
                        if !other.is_empty() {
                            warn!(input = other, "unknown command (use n/p/q)");
                        }
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = erratica::config::Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(slides) = cli.slides {
        cfg.slides_path = slides;
    }
    if let Some(seed) = cli.seed {
        cfg.startup_seed = Some(seed);
    }
    let cfg = cfg.validated().context("validating configuration")?;

    let slides = erratica::scan::scan_slides(&cfg.slides_path)
        .with_context(|| format!("scanning slides in {}", cfg.slides_path.display()))?;
    info!(count = slides.len(), "scanned slides");

    let show = SlideShow::new(slides, cfg.patches.clone())?;
    let mut sink = PngSequenceSink::new(cli.out.clone(), cfg.background_color)?;

    let (load_tx, load_rx) = mpsc::channel::<LoadSlide>(4);
    let (loaded_tx, loaded_rx) = mpsc::channel::<SlideLoaded>(4);
    let (invalid_tx, invalid_rx) = mpsc::channel::<InvalidSlide>(4);
    let (command_tx, command_rx) = mpsc::channel::<SlideCommand>(16);

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; shutting down");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cancel = cancel.clone();
        let max_in_flight = cfg.loader_max_concurrent_decodes;
        async move {
            erratica::tasks::loader::run(load_rx, loaded_tx, invalid_tx, cancel, max_in_flight)
                .await
                .context("loader task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            run_stdin_commands(command_tx, cancel).await;
            Ok(())
        }
    });

    let viewer_opts = ViewerOptions {
        frame_rate: cfg.frame_rate,
        frame_limit: cli.frames,
        auto_advance_ticks: cfg.auto_advance_ticks(),
        seed: cfg.startup_seed,
    };
    let result = erratica::tasks::viewer::run(
        show,
        loaded_rx,
        invalid_rx,
        command_rx,
        load_tx,
        &mut sink,
        cancel.clone(),
        viewer_opts,
    )
    .await;

    cancel.cancel();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("task ended with error: {err:#}"),
            Err(err) => warn!("task panicked: {err}"),
        }
    }

    result
}
