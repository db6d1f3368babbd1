pub mod image_helper {
    use crate::error::GameError;
    use image::{Rgba, RgbaImage, imageops};

    /// Wraps a raw RGBA buffer (4 bytes per pixel, row-major) as a frame.
    pub fn rgba_frame(width: u32, height: u32, buffer: Vec<u8>) -> Result<RgbaImage, GameError> {
        let expected = width as usize * height as usize * 4;
        let actual = buffer.len();
        if actual != expected {
            return Err(GameError::FrameBufferSize { expected, actual });
        }
        RgbaImage::from_raw(width, height, buffer).ok_or(GameError::FrameBufferSize { expected, actual })
    }

    /// Flips the frame left to right so the player sees a mirror image.
    pub fn mirror(frame: &RgbaImage) -> RgbaImage {
        imageops::flip_horizontal(frame)
    }

    /// Halves the brightness of every color channel, keeping alpha.
    pub fn dim(frame: &RgbaImage) -> RgbaImage {
        let mut dimmed = frame.clone();
        for Rgba([r, g, b, _]) in dimmed.pixels_mut() {
            *r /= 2;
            *g /= 2;
            *b /= 2;
        }
        dimmed
    }
}
