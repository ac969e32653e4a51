//! Streams raw RGBA frames into an external encoder process over a pipe.
//!
//! ```text
//! producer ── send_frame ──► [pipe] ──► ffmpeg stdin ──► output.mp4
//! ```
//!
//! A [`Session`] owns exactly one encoder process and the write end of its
//! stdin pipe. Frames are written in call order and must each be
//! `width * height * 4` bytes; the encoder splits the stream by byte count.

pub mod args;
pub mod error;
pub mod frame;
pub mod probe;
pub mod session;

pub use args::{EncodeProfile, EncoderConfig};
pub use error::{EncoderError, Result};
pub use frame::{BYTES_PER_PIXEL, FrameSize};
pub use probe::probe_version;
pub use session::{Session, SessionState};
