use std::io;
use std::time::Duration;

pub type Result<T, E = EncoderError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("invalid encoder config: {0}")]
    InvalidConfig(String),

    #[error("failed to create pipe: {0}")]
    PipeCreation(#[source] io::Error),

    #[error("failed to spawn encoder process {program:?}: {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The encoder executable could not be executed (not found, not executable).
    #[error("failed to execute encoder {program:?}: {source}")]
    ChildExec {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid frame size: expected {expected} bytes, got {actual}")]
    InvalidFrameSize { expected: usize, actual: usize },

    #[error("failed to write frame {frame}: {source}")]
    FrameWrite {
        frame: u64,
        #[source]
        source: io::Error,
    },

    /// An earlier write failed mid-stream; the frame boundaries are lost.
    #[error("encoder stream failed at frame {frame}, session must be closed")]
    StreamFailed { frame: u64 },

    #[error("encoder session is closed")]
    SessionClosed,

    /// `code` is `None` when the process was terminated by a signal.
    #[error("encoder exited abnormally (code {code:?})")]
    EncoderExitedAbnormally { code: Option<i32> },

    #[error("encoder did not exit within {0:?}, killed")]
    EncoderTimedOut(Duration),

    #[error("failed to wait for encoder: {0}")]
    Wait(#[source] io::Error),
}

/// Maps a spawn failure. A missing or non-executable program is `ChildExec`.
pub(crate) fn spawn_error(program: &str, source: io::Error) -> EncoderError {
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => EncoderError::ChildExec {
            program: program.to_string(),
            source,
        },
        _ => EncoderError::ProcessSpawn {
            program: program.to_string(),
            source,
        },
    }
}

impl EncoderError {
    /// Broken pipe while writing: the encoder went away before end of stream.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            EncoderError::FrameWrite { source, .. } if source.kind() == io::ErrorKind::BrokenPipe
        )
    }
}
