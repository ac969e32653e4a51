use bytes::BytesMut;
use ffmpeg_pipe::{BYTES_PER_PIXEL, FrameSize};

/// Animated RGBA test pattern standing in for the renderer.
///
/// The frame buffer is allocated once and redrawn in place every frame.
pub struct PatternSource {
    size: FrameSize,
    buffer: BytesMut,
}

impl PatternSource {
    pub fn new(size: FrameSize) -> anyhow::Result<Self> {
        let len = size.len()?;
        let mut buffer = BytesMut::with_capacity(len);
        buffer.resize(len, 0);
        Ok(Self { size, buffer })
    }

    /// Draws the frame at `time` seconds and returns its bytes.
    pub fn render(&mut self, time: f32) -> &[u8] {
        let width = self.size.width as usize;
        let w = self.size.width.max(1) as f32;
        let h = self.size.height.max(1) as f32;
        let shift = time * 0.25;
        let blue = (0.5 + 0.5 * (time * std::f32::consts::TAU * 0.5).sin()) * 255.0;

        for (i, px) in self.buffer.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let x = (i % width) as f32 / w;
            let y = (i / width) as f32 / h;
            px[0] = (((x + shift).fract()) * 255.0) as u8;
            px[1] = (((y + shift).fract()) * 255.0) as u8;
            px[2] = blue as u8;
            px[3] = 255;
        }
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_frame_len() {
        let mut source = PatternSource::new(FrameSize::new(16, 9)).unwrap();
        assert_eq!(source.render(0.0).len(), 16 * 9 * 4);
    }

    #[test]
    fn test_render_opaque() {
        let mut source = PatternSource::new(FrameSize::new(8, 8)).unwrap();
        let frame = source.render(0.5);
        assert!(frame.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_render_animates() {
        let mut source = PatternSource::new(FrameSize::new(8, 8)).unwrap();
        let first = source.render(0.0).to_vec();
        let second = source.render(1.0).to_vec();
        assert_ne!(first, second);
        // same time, same picture
        assert_eq!(source.render(0.0), first.as_slice());
    }
}
