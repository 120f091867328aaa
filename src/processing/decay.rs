//! Decay operator: darken a patch rect and roughen it with per-pixel noise.

use rand::Rng;

use crate::buffer::PixelBuffer;
use crate::config::DecayOptions;
use crate::patch::PatchRect;

/// Darken and noise every pixel inside `rect` intersected with the buffer
/// bounds, in place. `progress` is clamped to `[0, 1]`; rows and columns
/// outside the buffer are skipped silently. Alpha is never touched.
///
/// Noise is freshly sampled per channel per call, so repeated calls at the
/// same progress still flicker.
pub fn decay_rect<R: Rng + ?Sized>(
    buffer: &mut PixelBuffer,
    rect: PatchRect,
    progress: f32,
    opts: &DecayOptions,
    rng: &mut R,
) {
    let Some(clip) = rect.clipped(buffer.width(), buffer.height()) else {
        return;
    };
    let k = progress.clamp(0.0, 1.0);
    let darken = opts.darken_max * k;
    let noise_amp = opts.noise_max * k;

    let stride = buffer.width() as usize * 4;
    let bytes = buffer.as_bytes_mut();
    for y in clip.y0..clip.y1 {
        let row = y as usize * stride;
        for x in clip.x0..clip.x1 {
            let i = row + x as usize * 4;
            for c in 0..3 {
                let mut v = (f32::from(bytes[i + c]) - darken).max(0.0);
                if noise_amp > 0.0 {
                    v += rng.random_range(-noise_amp..=noise_amp);
                }
                bytes[i + c] = v.clamp(0.0, 255.0).round() as u8;
            }
        }
    }
}
