//! Frame loop: ticks the show at the configured rate, requests slide decodes
//! as they come into view, and hands every frame to the display sink.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{InvalidSlide, LoadSlide, SlideCommand, SlideLoaded};
use crate::render::sink::{Frame, FrameSink};
use crate::slides::{FrameOutcome, SlideShow};

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub frame_rate: u32,
    /// Stop after this many frames; `None` runs until cancelled.
    pub frame_limit: Option<u64>,
    /// Advance to the next slide after this many frames on one slide.
    pub auto_advance_ticks: Option<u64>,
    /// Deterministic seed for patch placement and noise.
    pub seed: Option<u64>,
}

/// Drive the show until cancellation or the frame limit.
///
/// The working buffer is mutated only inside this task's tick, so one writer
/// and one reader per frame stay strictly serialized.
pub async fn run(
    mut show: SlideShow,
    mut loaded_rx: Receiver<SlideLoaded>,
    mut invalid_rx: Receiver<InvalidSlide>,
    mut command_rx: Receiver<SlideCommand>,
    to_loader: Sender<LoadSlide>,
    sink: &mut dyn FrameSink,
    cancel: CancellationToken,
    opts: ViewerOptions,
) -> Result<()> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let period = Duration::from_secs_f64(1.0 / f64::from(opts.frame_rate.max(1)));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut requested: HashSet<usize> = HashSet::new();
    let mut invalid: HashSet<usize> = HashSet::new();
    let mut frames_rendered: u64 = 0;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                // Lazy-load the slide that just came into view.
                if let Some((index, path)) = show.missing_current()
                    && !invalid.contains(&index)
                    && requested.insert(index)
                {
                    if to_loader.send(LoadSlide { index, path }).await.is_err() {
                        warn!("loader channel closed");
                        break;
                    }
                }

                match show.advance_frame(&mut rng) {
                    FrameOutcome::Rendered => {
                        if let Some(buffer) = show.working() {
                            sink.present(Frame::Image(buffer)).context("presenting frame")?;
                        }
                    }
                    FrameOutcome::Loading => {
                        sink.present(Frame::Placeholder).context("presenting placeholder")?;
                    }
                }
                frames_rendered += 1;
                if let Some(limit) = opts.frame_limit
                    && frames_rendered >= limit
                {
                    info!(frames = frames_rendered, "frame limit reached");
                    break;
                }

                if let Some(dwell) = opts.auto_advance_ticks
                    && show.working().is_some()
                    && show.frames_on_slide() >= dwell
                {
                    let next = show.goto_next();
                    debug!(slide = next, "auto-advanced");
                }
            }

            Some(loaded) = loaded_rx.recv() => {
                requested.remove(&loaded.index);
                show.install_original(loaded.index, loaded.buffer);
            }

            Some(bad) = invalid_rx.recv() => {
                warn!(slide = bad.index, path = %bad.path.display(), "slide unavailable, keeping placeholder");
                requested.remove(&bad.index);
                invalid.insert(bad.index);
            }

            Some(command) = command_rx.recv() => {
                let slide = match command {
                    SlideCommand::Next => show.goto_next(),
                    SlideCommand::Prev => show.goto_prev(),
                };
                debug!(?command, slide, "navigated");
            }
        }
    }

    Ok(())
}
