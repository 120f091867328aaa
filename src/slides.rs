//! Slide controller: owns which image is current, the pristine buffer cache,
//! and the working buffer the patch engine mutates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::config::PatchOptions;
use crate::error::Error;
use crate::scheduler::PatchScheduler;

/// Outcome of advancing the show by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The current slide's pristine buffer is not available yet; the display
    /// stage substitutes a neutral placeholder.
    Loading,
    /// The working buffer holds this frame's pixels.
    Rendered,
}

/// The slideshow: an ordered slide sequence, lazily cached originals, and the
/// per-slide working state. The working buffer is rebuilt as a full copy of
/// the original every time the active slide changes; patch progress is
/// abandoned, never paused.
pub struct SlideShow {
    paths: Vec<PathBuf>,
    originals: Vec<Option<Arc<PixelBuffer>>>,
    current: usize,
    working: Option<PixelBuffer>,
    frames_on_slide: u64,
    scheduler: PatchScheduler,
}

impl SlideShow {
    /// Build a show over `paths` in the given order.
    ///
    /// # Errors
    /// Returns [`Error::EmptyScan`] if `paths` is empty.
    pub fn new(paths: Vec<PathBuf>, opts: PatchOptions) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(Error::EmptyScan);
        }
        let originals = vec![None; paths.len()];
        Ok(Self {
            paths,
            originals,
            current: 0,
            working: None,
            frames_on_slide: 0,
            scheduler: PatchScheduler::new(opts),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.paths[self.current]
    }

    /// First and last slides never receive patches. A single-slide show is
    /// entirely static.
    #[must_use]
    pub fn is_static(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.paths.len()
    }

    /// The slide the viewer still needs decoded, if any.
    #[must_use]
    pub fn missing_current(&self) -> Option<(usize, PathBuf)> {
        if self.originals[self.current].is_none() {
            Some((self.current, self.paths[self.current].clone()))
        } else {
            None
        }
    }

    /// Cache a decoded pristine buffer. When it belongs to the current slide
    /// the working buffer is rebuilt from it and patch state starts fresh.
    pub fn install_original(&mut self, index: usize, buffer: Arc<PixelBuffer>) {
        if index >= self.originals.len() {
            return;
        }
        self.originals[index] = Some(buffer);
        if index == self.current {
            self.enter_current_slide();
        }
    }

    #[must_use]
    pub fn original(&self, index: usize) -> Option<&Arc<PixelBuffer>> {
        self.originals.get(index).and_then(|slot| slot.as_ref())
    }

    /// Advance to the next slide, wrapping at the end.
    pub fn goto_next(&mut self) -> usize {
        self.current = (self.current + 1) % self.paths.len();
        self.enter_current_slide();
        self.current
    }

    /// Go back one slide, wrapping at the start.
    pub fn goto_prev(&mut self) -> usize {
        self.current = (self.current + self.paths.len() - 1) % self.paths.len();
        self.enter_current_slide();
        self.current
    }

    fn enter_current_slide(&mut self) {
        self.working = self.originals[self.current]
            .as_ref()
            .map(|original| original.as_ref().clone());
        self.frames_on_slide = 0;
        self.scheduler.reset();
        debug!(
            slide = self.current,
            loaded = self.working.is_some(),
            "entered slide"
        );
    }

    /// One animation frame: tick the patch engine unless the slide is static
    /// or its pristine buffer has not arrived yet.
    pub fn advance_frame<R: Rng + ?Sized>(&mut self, rng: &mut R) -> FrameOutcome {
        let static_slide = self.is_static(self.current);
        let Some(working) = self.working.as_mut() else {
            return FrameOutcome::Loading;
        };
        if static_slide {
            self.scheduler.clear();
        } else if let Some(original) = self.originals[self.current].as_ref() {
            self.scheduler.tick(working, original, rng);
        }
        self.frames_on_slide += 1;
        FrameOutcome::Rendered
    }

    /// The mutable frame for the display stage, once a slide has loaded.
    #[must_use]
    pub fn working(&self) -> Option<&PixelBuffer> {
        self.working.as_ref()
    }

    #[must_use]
    pub const fn frames_on_slide(&self) -> u64 {
        self.frames_on_slide
    }

    #[must_use]
    pub fn active_patch_count(&self) -> usize {
        self.scheduler.patches().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatchOptions;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn show(slide_count: usize) -> SlideShow {
        let paths = (0..slide_count)
            .map(|i| PathBuf::from(format!("slide{i:02}.jpg")))
            .collect();
        let opts = PatchOptions {
            interval_ticks: 1,
            min_per_tick: 1,
            max_per_tick: 1,
            min_size_px: 4,
            max_size_px: 4,
            decay: crate::config::DecayOptions {
                ticks: 10,
                darken_max: 50.0,
                noise_max: 0.0,
            },
            restore: crate::config::RestoreOptions {
                ticks: 10,
                ..Default::default()
            },
        };
        SlideShow::new(paths, opts).unwrap()
    }

    fn pristine() -> Arc<PixelBuffer> {
        Arc::new(PixelBuffer::filled(32, 32, [90, 90, 90]))
    }

    #[test]
    fn empty_show_is_rejected() {
        assert!(matches!(
            SlideShow::new(Vec::new(), PatchOptions::default()),
            Err(Error::EmptyScan)
        ));
    }

    #[test]
    fn first_and_last_slides_are_static() {
        let show = show(4);
        assert!(show.is_static(0));
        assert!(!show.is_static(1));
        assert!(!show.is_static(2));
        assert!(show.is_static(3));
    }

    #[test]
    fn single_slide_show_is_static() {
        let show = show(1);
        assert!(show.is_static(0));
    }

    #[test]
    fn renders_placeholder_until_original_arrives() {
        let mut show = show(3);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(show.advance_frame(&mut rng), FrameOutcome::Loading);
        assert!(show.working().is_none());
        assert_eq!(show.frames_on_slide(), 0);

        show.install_original(0, pristine());
        assert!(show.working().is_some());
        assert_eq!(show.advance_frame(&mut rng), FrameOutcome::Rendered);
        assert_eq!(show.frames_on_slide(), 1);
    }

    #[test]
    fn static_slide_never_accumulates_patches() {
        let mut show = show(3);
        show.install_original(0, pristine());
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..10 {
            assert_eq!(show.advance_frame(&mut rng), FrameOutcome::Rendered);
            assert_eq!(show.active_patch_count(), 0);
        }
        // Static slides pass the original through untouched.
        assert_eq!(show.working().unwrap().pixel(5, 5), [90, 90, 90, 255]);
    }

    #[test]
    fn interior_slide_spawns_and_slide_change_abandons_patches() {
        let mut show = show(3);
        show.install_original(0, pristine());
        show.install_original(1, pristine());
        let mut rng = StdRng::seed_from_u64(3);

        show.goto_next();
        assert_eq!(show.current_index(), 1);
        for _ in 0..5 {
            show.advance_frame(&mut rng);
        }
        assert!(show.active_patch_count() > 0);

        show.goto_next();
        assert_eq!(show.active_patch_count(), 0);
        assert_eq!(show.frames_on_slide(), 0);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        let mut show = show(3);
        assert_eq!(show.goto_prev(), 2);
        assert_eq!(show.goto_next(), 0);
        assert_eq!(show.goto_next(), 1);
    }

    #[test]
    fn returning_to_a_cached_slide_rebuilds_a_fresh_working_copy() {
        let mut show = show(3);
        show.install_original(0, pristine());
        show.install_original(1, pristine());
        let mut rng = StdRng::seed_from_u64(4);

        show.goto_next();
        // Let patches damage the working copy, then leave and come back.
        let mut opts_damage_seen = false;
        for _ in 0..200 {
            show.advance_frame(&mut rng);
            if show.working().unwrap().as_bytes() != pristine().as_bytes() {
                opts_damage_seen = true;
            }
        }
        assert!(opts_damage_seen);

        show.goto_prev();
        show.goto_next();
        // Fresh copy of the original, no residue from the earlier visit.
        assert_eq!(show.working().unwrap().as_bytes(), pristine().as_bytes());
    }

    #[test]
    fn missing_current_reports_the_slide_to_load() {
        let mut show = show(2);
        let (idx, path) = show.missing_current().unwrap();
        assert_eq!(idx, 0);
        assert_eq!(path, PathBuf::from("slide00.jpg"));
        show.install_original(0, pristine());
        assert!(show.missing_current().is_none());
    }

    #[test]
    fn install_for_non_current_slide_leaves_working_alone() {
        let mut show = show(3);
        show.install_original(1, pristine());
        assert!(show.working().is_none());
        assert!(show.original(1).is_some());
    }
}
