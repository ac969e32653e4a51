use std::time::{Duration, Instant};

use anyhow::Context;
use ffmpeg_pipe::{EncoderConfig, Session};
use tokio_util::sync::CancellationToken;

use crate::config::RecorderConfig;
use crate::pattern::PatternSource;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub frames: u64,
    pub bytes: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub fn record(config: &RecorderConfig, cancel: CancellationToken) -> anyhow::Result<Summary> {
    record_with(
        config.encoder_config(),
        config.total_frames(),
        config.close_timeout(),
        cancel,
    )
}

/// Blocking render loop: one pattern frame per iteration, in order, until
/// `total_frames` are sent or `cancel` fires. The session is closed either way
/// so the encoder can finalize its output.
pub fn record_with(
    encoder: EncoderConfig,
    total_frames: u64,
    close_timeout: Option<Duration>,
    cancel: CancellationToken,
) -> anyhow::Result<Summary> {
    let start = Instant::now();
    let mut session = Session::open(encoder).context("open encoder session")?;
    let mut source = PatternSource::new(session.size())?;
    let frame_time = 1.0 / session.fps() as f32;
    let mut cancelled = false;

    log::info!(
        "recorder: {} frames at {} @ {}fps",
        total_frames,
        session.size(),
        session.fps()
    );

    for frame in 0..total_frames {
        if cancel.is_cancelled() {
            log::info!("recorder: cancelled after {} frames", frame);
            cancelled = true;
            break;
        }

        let time = frame as f32 * frame_time;
        if let Err(e) = session.send_frame(source.render(time)) {
            // reap the encoder before reporting the write failure
            if let Err(close_err) = session.close() {
                log::warn!("recorder: close after write failure: {}", close_err);
            }
            return Err(e).with_context(|| format!("send frame {}", frame));
        }
    }

    match close_timeout {
        Some(timeout) => session.close_with_timeout(timeout),
        None => session.close(),
    }
    .context("close encoder session")?;

    Ok(Summary {
        frames: session.frames_sent(),
        bytes: session.bytes_written(),
        cancelled,
        elapsed: start.elapsed(),
    })
}

#[cfg(all(test, unix))]
#[path = "recorder_test.rs"]
mod recorder_test;
