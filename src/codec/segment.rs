//! Foreground segmentation
//!
//! A per-pixel running mean/variance background model over luma, in the
//! spirit of MOG2: pixels far from their learned distribution are foreground,
//! moderately-off pixels get the intermediate shadow value so the binarize
//! threshold decides their fate. The soft mask is binarized at a fixed
//! threshold and cleaned with a morphological opening before encoding.

use crate::capture::RawFrame;

/// Mask value for strong foreground
pub const FOREGROUND: u8 = 255;
/// Mask value for weak foreground / shadow; a binarize threshold below 127
/// keeps these, a higher one drops them
pub const SHADOW: u8 = 127;

/// Variance a freshly-reset pixel starts with
const INITIAL_VARIANCE: f32 = 225.0;
/// Floor that keeps a static pixel's variance from collapsing to zero
const MIN_VARIANCE: f32 = 4.0;

/// Adaptive per-pixel background statistics
///
/// Owned by a single producer loop; the broadcaster keeps it across
/// producer restarts so segmentation stays warm over reconnect bursts.
/// Resets itself when the frame dimensions change.
pub struct BackgroundModel {
    width: u32,
    height: u32,
    mean: Vec<f32>,
    variance: Vec<f32>,
    history: u32,
    var_threshold: f32,
    frames_seen: u64,
}

impl BackgroundModel {
    /// Create an empty model
    ///
    /// `history` bounds the automatic learning rate; `var_threshold` scales
    /// how many variances a pixel must deviate to count as foreground.
    pub fn new(history: u32, var_threshold: f32) -> Self {
        Self {
            width: 0,
            height: 0,
            mean: Vec::new(),
            variance: Vec::new(),
            history: history.max(1),
            var_threshold: var_threshold.max(1.0),
            frames_seen: 0,
        }
    }

    /// Number of frames absorbed since the last reset
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Absorb one frame and return the soft foreground mask
    ///
    /// The mask has one byte per pixel: [`FOREGROUND`], [`SHADOW`] or 0.
    /// `learning_rate` in `(0, 1]` blends the frame into the model; zero or
    /// negative selects an automatic `1/min(frames, history)` rate.
    /// A frame whose buffer does not match its dimensions is skipped: the
    /// model stays untouched and the mask comes back all background.
    pub fn apply(&mut self, frame: &RawFrame, learning_rate: f32) -> Vec<u8> {
        let pixels = frame.pixel_count();

        if frame.data.len() != pixels * 3 {
            tracing::warn!(
                len = frame.data.len(),
                expected = pixels * 3,
                "Frame buffer does not match its dimensions; skipping"
            );
            return vec![0u8; pixels];
        }

        if frame.width != self.width || frame.height != self.height {
            self.reset_to(frame);
            return vec![0u8; pixels];
        }

        self.frames_seen += 1;
        let alpha = if learning_rate > 0.0 {
            learning_rate.min(1.0)
        } else {
            1.0 / (self.frames_seen.min(self.history as u64) as f32)
        };

        let mut mask = vec![0u8; pixels];
        for (i, out) in mask.iter_mut().enumerate() {
            let y = luma(&frame.data[i * 3..i * 3 + 3]);
            let d = y - self.mean[i];
            let dist2 = d * d;
            let var = self.variance[i];

            if dist2 > self.var_threshold * var {
                *out = FOREGROUND;
            } else if dist2 > 0.5 * self.var_threshold * var {
                *out = SHADOW;
            }

            self.mean[i] += alpha * d;
            self.variance[i] = (var + alpha * (dist2 - var)).max(MIN_VARIANCE);
        }
        mask
    }

    fn reset_to(&mut self, frame: &RawFrame) {
        let pixels = frame.pixel_count();
        self.width = frame.width;
        self.height = frame.height;
        self.mean = (0..pixels)
            .map(|i| luma(&frame.data[i * 3..i * 3 + 3]))
            .collect();
        self.variance = vec![INITIAL_VARIANCE; pixels];
        self.frames_seen = 1;
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            "Background model reset"
        );
    }
}

fn luma(rgb: &[u8]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

/// Binarize a soft mask in place: values above `threshold` become 255,
/// everything else becomes 0
pub fn binarize(mask: &mut [u8], threshold: u8) {
    for v in mask.iter_mut() {
        *v = if *v > threshold { 255 } else { 0 };
    }
}

/// Morphological opening (erode then dilate) with a square kernel
///
/// Removes speckle noise smaller than the kernel while preserving larger
/// connected regions. Borders are handled by clamping the window to the
/// image. `kernel_size` is forced odd and at least 1.
pub fn morph_open(mask: &[u8], width: u32, height: u32, kernel_size: u32) -> Vec<u8> {
    let k = kernel_size.max(1) | 1;
    let radius = (k / 2) as i64;
    let eroded = morph(mask, width, height, radius, u8::min, 255);
    morph(&eroded, width, height, radius, u8::max, 0)
}

fn morph(
    mask: &[u8],
    width: u32,
    height: u32,
    radius: i64,
    fold: fn(u8, u8) -> u8,
    identity: u8,
) -> Vec<u8> {
    let (w, h) = (width as i64, height as i64);
    let mut out = vec![0u8; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = identity;
            for dy in -radius..=radius {
                let yy = (y + dy).clamp(0, h - 1);
                for dx in -radius..=radius {
                    let xx = (x + dx).clamp(0, w - 1);
                    acc = fold(acc, mask[(yy * w + xx) as usize]);
                }
            }
            out[(y * w + x) as usize] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32, value: u8) -> RawFrame {
        RawFrame::solid(width, height, [value, value, value])
    }

    #[test]
    fn test_static_scene_is_background() {
        let mut model = BackgroundModel::new(200, 16.0);
        let frame = gray_frame(8, 8, 100);

        for _ in 0..10 {
            let mask = model.apply(&frame, 0.7);
            assert!(mask.iter().all(|&v| v == 0));
        }
        assert_eq!(model.frames_seen(), 10);
    }

    #[test]
    fn test_sudden_bright_region_is_foreground() {
        let mut model = BackgroundModel::new(200, 16.0);
        let background = gray_frame(8, 8, 30);
        for _ in 0..10 {
            model.apply(&background, 0.7);
        }

        // Paint the top-left quadrant bright.
        let mut moved = background.clone();
        for y in 0..4 {
            for x in 0..4 {
                let i = (y * 8 + x) * 3;
                moved.data[i..i + 3].copy_from_slice(&[230, 230, 230]);
            }
        }
        let mask = model.apply(&moved, 0.7);

        assert_eq!(mask[0], FOREGROUND);
        assert_eq!(mask[3 * 8 + 3], FOREGROUND);
        assert_eq!(mask[7 * 8 + 7], 0);
    }

    #[test]
    fn test_dimension_change_resets_model() {
        let mut model = BackgroundModel::new(200, 16.0);
        model.apply(&gray_frame(8, 8, 100), 0.7);
        model.apply(&gray_frame(8, 8, 100), 0.7);
        assert_eq!(model.frames_seen(), 2);

        let mask = model.apply(&gray_frame(4, 4, 250), 0.7);
        assert!(mask.iter().all(|&v| v == 0)); // first frame after reset
        assert_eq!(model.frames_seen(), 1);
    }

    #[test]
    fn test_mismatched_buffer_is_skipped() {
        let mut model = BackgroundModel::new(200, 16.0);
        model.apply(&gray_frame(8, 8, 100), 0.7);
        model.apply(&gray_frame(8, 8, 100), 0.7);

        let bad = RawFrame {
            width: 8,
            height: 8,
            data: vec![0u8; 7],
        };
        let mask = model.apply(&bad, 0.7);

        assert_eq!(mask.len(), 64);
        assert!(mask.iter().all(|&v| v == 0));
        // The model neither advanced nor reset.
        assert_eq!(model.frames_seen(), 2);
    }

    #[test]
    fn test_binarize_is_strictly_above_threshold() {
        let mut mask = vec![0, SHADOW, FOREGROUND, 121, 120];
        binarize(&mut mask, 120);
        // Shadows (127) sit above the default 120 threshold and survive.
        assert_eq!(mask, vec![0, 255, 255, 255, 0]);

        let mut mask = vec![0, SHADOW, FOREGROUND];
        binarize(&mut mask, 200);
        assert_eq!(mask, vec![0, 0, 255]);
    }

    #[test]
    fn test_opening_removes_speckle() {
        let mut mask = vec![0u8; 64];
        mask[3 * 8 + 3] = 255; // lone pixel
        let cleaned = morph_open(&mask, 8, 8, 3);
        assert!(cleaned.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_opening_keeps_solid_block() {
        let mut mask = vec![0u8; 64];
        for y in 1..7 {
            for x in 1..7 {
                mask[y * 8 + x] = 255;
            }
        }
        let cleaned = morph_open(&mask, 8, 8, 3);
        // Interior of a 6x6 block survives a 3x3 opening.
        assert_eq!(cleaned[3 * 8 + 3], 255);
        assert_eq!(cleaned[2 * 8 + 2], 255);
    }
}
