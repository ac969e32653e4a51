use std::fmt::{Display, Formatter};

use crate::error::{EncoderError, Result};

/// RGBA, one byte per channel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel format name ffmpeg expects for the input stream.
pub const INPUT_PIXEL_FORMAT: &str = "rgba";

/// Dimensions of every frame in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of bytes in one row-major RGBA frame.
    pub fn len(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                EncoderError::InvalidConfig(format!("frame size {} overflows usize", self))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `WIDTHxHEIGHT`, as passed to `-s`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Display for FrameSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for FrameSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(FrameSize::new(4, 2).len().unwrap(), 32);
        assert_eq!(FrameSize::new(1200, 800).len().unwrap(), 1200 * 800 * 4);
    }

    #[test]
    fn test_resolution_string() {
        let size = FrameSize::from((1920, 1080));
        assert_eq!(size.resolution(), "1920x1080");
        assert_eq!(size.to_string(), "1920x1080");
    }

    #[test]
    fn test_is_empty() {
        assert!(FrameSize::new(0, 10).is_empty());
        assert!(FrameSize::new(10, 0).is_empty());
        assert!(!FrameSize::new(1, 1).is_empty());
    }
}
