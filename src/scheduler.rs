//! Patch scheduler: spawns damage patches on a cadence and drives each one
//! through the decay → restore state machine against the working buffer.

use rand::Rng;
use tracing::trace;

use crate::buffer::PixelBuffer;
use crate::config::PatchOptions;
use crate::patch::{Patch, PatchPhase, PatchRect};
use crate::processing::{decay, restore};

/// Owns the active patch set and the tick counter for one slide at a time.
///
/// Driven once per animation frame by the viewer; never ticked while the
/// current slide is static or its original buffer is still loading.
#[derive(Debug)]
pub struct PatchScheduler {
    opts: PatchOptions,
    patches: Vec<Patch>,
    ticks: u64,
}

impl PatchScheduler {
    #[must_use]
    pub const fn new(opts: PatchOptions) -> Self {
        Self {
            opts,
            patches: Vec::new(),
            ticks: 0,
        }
    }

    /// Advance the show by one frame: maybe spawn, then step every active
    /// patch exactly once. `working` is the only buffer mutated; `original`
    /// is the pristine source the restore phase heals toward.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        working: &mut PixelBuffer,
        original: &PixelBuffer,
        rng: &mut R,
    ) {
        if self.ticks % self.opts.interval_ticks == 0 {
            let n = rng.random_range(self.opts.min_per_tick..=self.opts.max_per_tick);
            for _ in 0..n {
                self.spawn(working.width(), working.height(), rng);
            }
            trace!(spawned = n, active = self.patches.len(), "patch spawn tick");
        }

        // Back-to-front so removing a finished patch cannot skip a neighbor.
        for i in (0..self.patches.len()).rev() {
            let patch = &mut self.patches[i];
            match patch.phase {
                PatchPhase::Decaying => {
                    let k = (patch.t as f32 / self.opts.decay.ticks as f32).clamp(0.0, 1.0);
                    decay::decay_rect(working, patch.rect, k, &self.opts.decay, rng);
                    patch.t += 1;
                    if patch.t >= self.opts.decay.ticks {
                        patch.phase = PatchPhase::Restoring;
                        patch.t = 0;
                    }
                }
                PatchPhase::Restoring => {
                    let k = (patch.t as f32 / self.opts.restore.ticks as f32
                        + self.opts.restore.blend_bias)
                        .clamp(0.0, 1.0);
                    restore::restore_rect(
                        working,
                        original,
                        patch.rect,
                        k,
                        &self.opts.restore,
                        rng,
                    );
                    patch.t += 1;
                    if patch.t >= self.opts.restore.ticks {
                        self.patches.remove(i);
                    }
                }
            }
        }

        self.ticks += 1;
    }

    fn spawn<R: Rng + ?Sized>(&mut self, width: u32, height: u32, rng: &mut R) {
        let pw = rng.random_range(self.opts.min_size_px..=self.opts.max_size_px);
        let ph = rng.random_range(self.opts.min_size_px..=self.opts.max_size_px);
        // Corner range degenerates to 0 when the patch spans the buffer.
        let x = if width > pw {
            rng.random_range(0..width - pw)
        } else {
            0
        };
        let y = if height > ph {
            rng.random_range(0..height - ph)
        } else {
            0
        };
        self.patches.push(Patch::new(PatchRect {
            x: x as i32,
            y: y as i32,
            width: pw,
            height: ph,
        }));
    }

    /// Empty the active set without touching the spawn timer. Used on every
    /// frame of a static slide.
    pub fn clear(&mut self) {
        self.patches.clear();
    }

    /// Slide change: abandon all patches and restart the spawn timer.
    pub fn reset(&mut self) {
        self.patches.clear();
        self.ticks = 0;
    }

    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}
