//! Restore operator: heal a damaged rect back toward the pristine buffer by
//! blending a neighbor-sampled patch with the untranslated original, the way
//! a clone/patch retouching tool fills a selection from nearby pixels.

use rand::Rng;

use crate::buffer::PixelBuffer;
use crate::config::RestoreOptions;
use crate::patch::{ClippedRect, PatchRect};

/// Blend `dest` inside `rect ∩ bounds` toward a stylized reconstruction of
/// `src`. `alpha` is clamped to `[0, 1]`; 0 leaves `dest` unchanged, 1 writes
/// the reconstruction outright. `src` is read-only; alpha bytes in `dest` are
/// never modified.
///
/// One random sampling offset is drawn per call, not per pixel, so the whole
/// patch borrows from the same neighborhood.
pub fn restore_rect<R: Rng + ?Sized>(
    dest: &mut PixelBuffer,
    src: &PixelBuffer,
    rect: PatchRect,
    alpha: f32,
    opts: &RestoreOptions,
    rng: &mut R,
) {
    let Some(clip) = rect.clipped(dest.width(), dest.height()) else {
        return;
    };
    let alpha = alpha.clamp(0.0, 1.0);

    let off_x = sample_offset(rect.width, rng);
    let off_y = sample_offset(rect.height, rng);

    let drift = opts.chroma_drift;
    let gains = if drift > 0.0 {
        [1.0 + drift * 0.6, 1.0 - drift * 0.3, 1.0 - drift * 0.6]
    } else {
        [1.0, 1.0, 1.0]
    };

    let src_max_x = i64::from(src.width()) - 1;
    let src_max_y = i64::from(src.height()) - 1;
    let stride = dest.width() as usize * 4;
    let bytes = dest.as_bytes_mut();

    for y in clip.y0..clip.y1 {
        let ny = (i64::from(y) + off_y).clamp(0, src_max_y) as u32;
        let oy = i64::from(y).min(src_max_y) as u32;
        let row = y as usize * stride;
        for x in clip.x0..clip.x1 {
            let nx = (i64::from(x) + off_x).clamp(0, src_max_x) as u32;
            let ox = i64::from(x).min(src_max_x) as u32;
            let neighbor = src.pixel(nx, ny);
            let original = src.pixel(ox, oy);
            let i = row + x as usize * 4;
            for c in 0..3 {
                let sampled = (f32::from(neighbor[c]) * gains[c]).clamp(0.0, 255.0);
                let blended = sampled * opts.neighbor_weight
                    + f32::from(original[c]) * opts.original_weight;
                let current = f32::from(bytes[i + c]);
                let healed = current * (1.0 - alpha) + blended * alpha;
                bytes[i + c] = healed.clamp(0.0, 255.0).round() as u8;
            }
        }
    }

    if opts.seam_strength > 0.0 {
        apply_seam(dest, clip, opts.seam_strength);
    }
    if opts.blur_radius > 0 {
        box_blur_rows(dest, clip, opts.blur_radius);
    }
}

fn sample_offset<R: Rng + ?Sized>(extent: u32, rng: &mut R) -> i64 {
    let half = extent as f32 * 0.5;
    if half <= 0.0 {
        return 0;
    }
    rng.random_range(-half..half) as i64
}

/// Darken the top row and left column, lighten the bottom row and right
/// column, leaving a visible "pasted on" seam around the rect.
fn apply_seam(dest: &mut PixelBuffer, clip: ClippedRect, strength: f32) {
    let darken = 1.0 - strength;
    let lighten = 1.0 + strength;
    let stride = dest.width() as usize * 4;
    let bytes = dest.as_bytes_mut();

    let scale_px = |bytes: &mut [u8], i: usize, factor: f32| {
        for c in 0..3 {
            let v = f32::from(bytes[i + c]) * factor;
            bytes[i + c] = v.clamp(0.0, 255.0).round() as u8;
        }
    };

    for x in clip.x0..clip.x1 {
        scale_px(bytes, clip.y0 as usize * stride + x as usize * 4, darken);
        if clip.y1 - clip.y0 > 1 {
            scale_px(
                bytes,
                (clip.y1 - 1) as usize * stride + x as usize * 4,
                lighten,
            );
        }
    }
    // Columns skip the corner pixels already covered by the row passes.
    for y in clip.y0 + 1..clip.y1.saturating_sub(1) {
        scale_px(bytes, y as usize * stride + clip.x0 as usize * 4, darken);
        if clip.x1 - clip.x0 > 1 {
            scale_px(
                bytes,
                y as usize * stride + (clip.x1 - 1) as usize * 4,
                lighten,
            );
        }
    }
}

/// Horizontal box blur over the rect rows to soften hard edges. The window is
/// clamped to the rect so pixels outside it never bleed in.
fn box_blur_rows(dest: &mut PixelBuffer, clip: ClippedRect, radius: u32) {
    let radius = radius as i64;
    let stride = dest.width() as usize * 4;
    let bytes = dest.as_bytes_mut();
    let width = (clip.x1 - clip.x0) as usize;
    let mut source_row = vec![0u8; width * 4];

    for y in clip.y0..clip.y1 {
        let row = y as usize * stride;
        let start = row + clip.x0 as usize * 4;
        source_row.copy_from_slice(&bytes[start..start + width * 4]);
        for x in clip.x0..clip.x1 {
            let lo = (i64::from(x) - radius).max(i64::from(clip.x0));
            let hi = (i64::from(x) + radius).min(i64::from(clip.x1) - 1);
            let count = (hi - lo + 1) as f32;
            let i = row + x as usize * 4;
            for c in 0..3 {
                let mut sum = 0.0f32;
                for sx in lo..=hi {
                    let si = (sx - i64::from(clip.x0)) as usize * 4;
                    sum += f32::from(source_row[si + c]);
                }
                bytes[i + c] = (sum / count).clamp(0.0, 255.0).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn plain_opts() -> RestoreOptions {
        RestoreOptions {
            ticks: 10,
            neighbor_weight: 0.0,
            original_weight: 1.0,
            chroma_drift: 0.0,
            seam_strength: 0.0,
            blur_radius: 0,
            blend_bias: 0.0,
        }
    }

    fn gradient(size: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::filled(size, size, [0, 0, 0]);
        for y in 0..size {
            for x in 0..size {
                let i = buf.offset(x, y);
                let bytes = buf.as_bytes_mut();
                bytes[i] = (x * 7 % 256) as u8;
                bytes[i + 1] = (y * 11 % 256) as u8;
                bytes[i + 2] = ((x + y) * 3 % 256) as u8;
            }
        }
        buf
    }

    #[test]
    fn alpha_zero_leaves_dest_unchanged() {
        let src = gradient(16);
        let mut dest = PixelBuffer::filled(16, 16, [40, 40, 40]);
        let before = dest.clone();
        let mut rng = StdRng::seed_from_u64(11);
        let rect = PatchRect {
            x: 2,
            y: 2,
            width: 8,
            height: 8,
        };
        restore_rect(&mut dest, &src, rect, 0.0, &plain_opts(), &mut rng);
        assert_eq!(dest, before);
    }

    #[test]
    fn alpha_one_with_original_only_weights_copies_src() {
        let src = gradient(16);
        let mut dest = PixelBuffer::filled(16, 16, [40, 40, 40]);
        let mut rng = StdRng::seed_from_u64(11);
        let rect = PatchRect {
            x: 3,
            y: 5,
            width: 7,
            height: 6,
        };
        restore_rect(&mut dest, &src, rect, 1.0, &plain_opts(), &mut rng);
        for y in 5..11 {
            for x in 3..10 {
                let expected = src.pixel(x, y);
                let got = dest.pixel(x, y);
                assert_eq!(got[..3], expected[..3], "pixel ({x},{y})");
            }
        }
        // Outside the rect nothing moved.
        assert_eq!(dest.pixel(0, 0), [40, 40, 40, 255]);
        assert_eq!(dest.pixel(15, 15), [40, 40, 40, 255]);
    }

    #[test]
    fn alpha_bytes_survive_every_pass() {
        let src = gradient(12);
        let mut dest = gradient(12);
        for i in (3..dest.as_bytes().len()).step_by(4) {
            dest.as_bytes_mut()[i] = 200;
        }
        let opts = RestoreOptions {
            neighbor_weight: 0.5,
            original_weight: 0.6,
            chroma_drift: 0.01,
            seam_strength: 0.1,
            blur_radius: 2,
            ..plain_opts()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let rect = PatchRect {
            x: 1,
            y: 1,
            width: 10,
            height: 10,
        };
        restore_rect(&mut dest, &src, rect, 0.8, &opts, &mut rng);
        for i in (3..dest.as_bytes().len()).step_by(4) {
            assert_eq!(dest.as_bytes()[i], 200);
        }
    }

    #[test]
    fn channels_stay_in_range_with_unnormalized_weights() {
        let src = PixelBuffer::filled(8, 8, [250, 250, 250]);
        let mut dest = PixelBuffer::filled(8, 8, [250, 250, 250]);
        let opts = RestoreOptions {
            neighbor_weight: 0.9,
            original_weight: 0.9,
            ..plain_opts()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let rect = PatchRect {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
        };
        for _ in 0..20 {
            restore_rect(&mut dest, &src, rect, 0.5, &opts, &mut rng);
        }
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(dest.pixel(x, y)[3], 255);
            }
        }
    }

    #[test]
    fn overhanging_rect_only_touches_overlap() {
        let src = gradient(10);
        let mut dest = PixelBuffer::filled(10, 10, [30, 30, 30]);
        let mut rng = StdRng::seed_from_u64(6);
        let rect = PatchRect {
            x: 7,
            y: 7,
            width: 20,
            height: 20,
        };
        restore_rect(&mut dest, &src, rect, 1.0, &plain_opts(), &mut rng);
        assert_eq!(dest.pixel(6, 6), [30, 30, 30, 255]);
        assert_eq!(dest.pixel(7, 7)[..3], src.pixel(7, 7)[..3]);
        assert_eq!(dest.pixel(9, 9)[..3], src.pixel(9, 9)[..3]);
    }

    #[test]
    fn seam_darkens_top_left_and_lightens_bottom_right() {
        let src = PixelBuffer::filled(10, 10, [100, 100, 100]);
        let mut dest = PixelBuffer::filled(10, 10, [100, 100, 100]);
        let opts = RestoreOptions {
            seam_strength: 0.2,
            ..plain_opts()
        };
        let mut rng = StdRng::seed_from_u64(8);
        let rect = PatchRect {
            x: 2,
            y: 2,
            width: 6,
            height: 6,
        };
        restore_rect(&mut dest, &src, rect, 1.0, &opts, &mut rng);
        assert_eq!(dest.pixel(4, 2)[0], 80); // top row
        assert_eq!(dest.pixel(2, 4)[0], 80); // left column
        assert_eq!(dest.pixel(4, 7)[0], 120); // bottom row
        assert_eq!(dest.pixel(7, 4)[0], 120); // right column
        assert_eq!(dest.pixel(4, 4)[0], 100); // interior untouched
    }

    #[test]
    fn box_blur_flattens_an_edge_inside_the_rect() {
        let src = PixelBuffer::filled(8, 4, [0, 0, 0]);
        let mut dest = PixelBuffer::filled(8, 4, [0, 0, 0]);
        // Hard vertical edge: left half black, right half white.
        for y in 0..4 {
            for x in 4..8 {
                let i = dest.offset(x, y);
                dest.as_bytes_mut()[i] = 255;
            }
        }
        let opts = RestoreOptions {
            blur_radius: 1,
            ..plain_opts()
        };
        let mut rng = StdRng::seed_from_u64(12);
        let rect = PatchRect {
            x: 0,
            y: 0,
            width: 8,
            height: 4,
        };
        restore_rect(&mut dest, &src, rect, 0.0, &opts, &mut rng);
        // alpha 0 skips the blend entirely; only the blur pass ran.
        assert_eq!(dest.pixel(3, 1)[0], 85); // (0 + 0 + 255) / 3
        assert_eq!(dest.pixel(4, 1)[0], 170); // (0 + 255 + 255) / 3
        assert_eq!(dest.pixel(1, 1)[0], 0);
        assert_eq!(dest.pixel(6, 1)[0], 255);
    }
}
