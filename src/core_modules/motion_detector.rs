// THEORY:
// The `MotionDetector` is the sensory layer of the game. It turns the stream of
// camera frames into a stream of binary "motion masks": images where a pixel is
// active when the scene changed enough at that spot since the previous frame.
//
// Key architectural principles:
// 1.  **Intensity only**: Color is irrelevant for motion. Each frame is reduced
//     to luma and blurred, so camera sensor noise is smeared out before any
//     comparison happens.
// 2.  **Explicit warm-up**: A difference needs two frames. Until the detector
//     has cached one, it sits in `DetectorState::Warming` and reports no mask.
//     This is a state, not an error, and the very first tick never scores.
// 3.  **Noise rejection**: After the absolute difference is thresholded, a
//     morphological opening (erosion then dilation with a small square) removes
//     isolated speckles while keeping coherent moving regions intact.
// 4.  **Single-frame memory**: Exactly one intensity image is cached. It is
//     replaced on every call, whatever the outcome.

use image::{GrayImage, Luma, RgbaImage, imageops};
use log::warn;

/// Sigma matching the Gaussian an OpenCV 15x15 kernel derives with sigma 0.
const BLUR_SIGMA: f32 = 2.6;
/// Pixels whose intensity changed by more than this are active.
const DIFFERENCE_THRESHOLD: u8 = 25;
/// Side of the square structuring element used for the opening.
const OPENING_KERNEL_SIZE: u32 = 5;

const ACTIVE: u8 = 255;
const INACTIVE: u8 = 0;

/// A binary image marking the pixels that moved between two frames.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionMask {
    pixels: GrayImage,
}

impl MotionMask {
    /// Wraps a grayscale image; any non-zero pixel counts as active.
    pub fn from_image(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    /// Builds a mask by asking `active` about every pixel.
    pub fn from_fn(width: u32, height: u32, active: impl Fn(u32, u32) -> bool) -> Self {
        Self::from_image(GrayImage::from_fn(width, height, |x, y| {
            Luma([if active(x, y) { ACTIVE } else { INACTIVE }])
        }))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_active(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] != INACTIVE
    }

    /// Counts the active pixels in the half-open rectangle `[x0, x1) x [y0, y1)`.
    /// The rectangle must already be clipped to the mask.
    pub fn count_active(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u32 {
        (y0..y1)
            .map(|y| (x0..x1).filter(|&x| self.is_active(x, y)).count() as u32)
            .sum()
    }

    /// Total number of active pixels.
    pub fn active_count(&self) -> u32 {
        self.pixels.as_raw().iter().filter(|&&v| v != INACTIVE).count() as u32
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.pixels
    }
}

/// What the detector remembers between frames.
#[derive(Debug, Clone)]
pub enum DetectorState {
    /// No previous intensity image yet; the next frame only primes the cache.
    Warming,
    /// The blurred intensity image of the previous frame.
    Primed(GrayImage),
}

/// Converts consecutive frames into motion masks.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    state: DetectorState,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDetector {
    pub fn new() -> Self {
        Self {
            state: DetectorState::Warming,
        }
    }

    pub fn is_warming(&self) -> bool {
        matches!(self.state, DetectorState::Warming)
    }

    /// Feeds one frame. Returns `None` while warming up, otherwise the mask of
    /// what moved since the previous frame.
    pub fn detect(&mut self, frame: &RgbaImage) -> Option<MotionMask> {
        let intensity = Self::intensity(frame);

        let mask = match &self.state {
            DetectorState::Warming => None,
            DetectorState::Primed(previous) if previous.dimensions() != intensity.dimensions() => {
                warn!(
                    "Frame size changed from {:?} to {:?}; motion detector re-warming",
                    previous.dimensions(),
                    intensity.dimensions()
                );
                None
            }
            DetectorState::Primed(previous) => Some(Self::motion_between(previous, &intensity)),
        };

        self.state = DetectorState::Primed(intensity);
        mask
    }

    /// Single-channel, blurred version of the frame.
    fn intensity(frame: &RgbaImage) -> GrayImage {
        let gray = imageops::grayscale(frame);
        imageops::blur(&gray, BLUR_SIGMA)
    }

    fn motion_between(previous: &GrayImage, current: &GrayImage) -> MotionMask {
        let (width, height) = current.dimensions();
        let thresholded: Vec<u8> = previous
            .as_raw()
            .iter()
            .zip(current.as_raw())
            .map(|(&a, &b)| {
                if a.abs_diff(b) > DIFFERENCE_THRESHOLD {
                    ACTIVE
                } else {
                    INACTIVE
                }
            })
            .collect();

        // Both inputs share dimensions, so the buffer length always matches.
        let thresholded = GrayImage::from_raw(width, height, thresholded)
            .unwrap_or_else(|| GrayImage::new(width, height));

        MotionMask::from_image(open(&thresholded, OPENING_KERNEL_SIZE / 2))
    }
}

/// Morphological opening with a square structuring element of side `2 * reach + 1`.
fn open(mask: &GrayImage, reach: u32) -> GrayImage {
    let eroded = rank_filter(mask, reach, u8::MAX, u8::min);
    rank_filter(&eroded, reach, u8::MIN, u8::max)
}

/// Applies `pick` over a square window, separably (rows then columns).
/// Neighbours outside the image are ignored.
fn rank_filter(image: &GrayImage, reach: u32, identity: u8, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = image.dimensions();

    let rows = GrayImage::from_fn(width, height, |x, y| {
        let lo = x.saturating_sub(reach);
        let hi = (x + reach).min(width - 1);
        Luma([(lo..=hi).fold(identity, |acc, nx| pick(acc, image.get_pixel(nx, y)[0]))])
    });

    GrayImage::from_fn(width, height, |x, y| {
        let lo = y.saturating_sub(reach);
        let hi = (y + reach).min(height - 1);
        Luma([(lo..=hi).fold(identity, |acc, ny| pick(acc, rows.get_pixel(x, ny)[0]))])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn flat_frame(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn frame_with_block(width: u32, height: u32, x0: u32, y0: u32, side: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if x >= x0 && x < x0 + side && y >= y0 && y < y0 + side {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn first_frame_only_warms_up() {
        let mut detector = MotionDetector::new();
        assert!(detector.is_warming());
        assert!(detector.detect(&flat_frame(32, 32, 0)).is_none());
        assert!(!detector.is_warming());
    }

    #[test]
    fn static_scene_produces_an_empty_mask() {
        let mut detector = MotionDetector::new();
        detector.detect(&flat_frame(40, 30, 90));
        let mask = detector.detect(&flat_frame(40, 30, 90)).expect("primed");
        assert_eq!((mask.width(), mask.height()), (40, 30));
        assert_eq!(mask.active_count(), 0);
    }

    #[test]
    fn a_change_of_exactly_the_threshold_is_not_motion() {
        let mut detector = MotionDetector::new();
        detector.detect(&flat_frame(64, 48, 0));
        let mask = detector.detect(&flat_frame(64, 48, 25)).expect("primed");
        assert_eq!(mask.active_count(), 0);

        let mut detector = MotionDetector::new();
        detector.detect(&flat_frame(64, 48, 0));
        let mask = detector.detect(&flat_frame(64, 48, 26)).expect("primed");
        assert_eq!(mask.active_count(), 64 * 48);
    }

    #[test]
    fn a_new_bright_block_is_detected_where_it_appeared() {
        let mut detector = MotionDetector::new();
        detector.detect(&flat_frame(100, 100, 0));
        let mask = detector
            .detect(&frame_with_block(100, 100, 40, 40, 30))
            .expect("primed");

        assert!(mask.is_active(55, 55));
        assert!(!mask.is_active(5, 5));
        assert!(!mask.is_active(95, 95));
        assert!(mask.count_active(40, 40, 70, 70) > 30 * 30 / 2);
    }

    #[test]
    fn opening_removes_isolated_speckles() {
        let mut speckled = GrayImage::new(20, 20);
        speckled.put_pixel(3, 3, Luma([ACTIVE]));
        speckled.put_pixel(10, 12, Luma([ACTIVE]));
        for y in 5..15 {
            for x in 5..9 {
                speckled.put_pixel(x, y, Luma([ACTIVE]));
            }
        }
        let opened = open(&speckled, 2);
        assert_eq!(opened.get_pixel(3, 3)[0], INACTIVE);
        assert_eq!(opened.get_pixel(10, 12)[0], INACTIVE);
        // A 4-pixel-wide bar is thinner than the 5x5 element and vanishes too.
        assert_eq!(opened.get_pixel(6, 10)[0], INACTIVE);

        let mut solid = GrayImage::new(20, 20);
        for y in 4..16 {
            for x in 4..16 {
                solid.put_pixel(x, y, Luma([ACTIVE]));
            }
        }
        assert_eq!(open(&solid, 2), solid);
    }

    #[test]
    fn resized_frame_re_warms_instead_of_failing() {
        let mut detector = MotionDetector::new();
        detector.detect(&flat_frame(32, 32, 0));
        assert!(detector.detect(&flat_frame(16, 16, 255)).is_none());
        let mask = detector.detect(&flat_frame(16, 16, 255)).expect("primed again");
        assert_eq!(mask.active_count(), 0);
    }

    #[test]
    fn count_active_respects_the_rectangle() {
        let mask = MotionMask::from_fn(10, 10, |x, _| x < 5);
        assert_eq!(mask.count_active(0, 0, 10, 10), 50);
        assert_eq!(mask.count_active(3, 0, 7, 2), 4);
        assert_eq!(mask.count_active(5, 5, 10, 10), 0);
    }
}
