use std::fmt::{Display, Formatter};
use std::io::{self, PipeWriter, Write};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use crate::args::EncoderConfig;
use crate::error::{EncoderError, Result, spawn_error};
use crate::frame::FrameSize;

/// Grace period a dropped, unclosed session gives the encoder before killing it.
const DROP_GRACE: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Spawned, no frame sent yet.
    Open,
    /// At least one frame written.
    Sending,
    /// Pipe closed and encoder reaped.
    Closed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Open => write!(f, "open"),
            SessionState::Sending => write!(f, "sending"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// One encoder process fed through one pipe.
///
/// Frames are written synchronously in call order. A full pipe blocks
/// [`Session::send_frame`] until the encoder catches up, so a slow encoder
/// throttles the producer instead of growing a queue.
///
/// [`Session::close`] is the teardown path: it closes the pipe so the encoder
/// sees end of input, then blocks until the process exits.
pub struct Session {
    config: EncoderConfig,
    frame_len: usize,
    child: Child,
    writer: Option<PipeWriter>,
    state: SessionState,
    // frame index of the write that broke the stream
    failed_at: Option<u64>,
    frames_sent: u64,
    bytes_written: u64,
}

impl Session {
    /// Spawns the encoder with its stdin connected to a new pipe.
    pub fn open(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        let frame_len = config.size.len()?;

        let (reader, writer) = io::pipe().map_err(EncoderError::PipeCreation)?;

        let program = config.program().to_string();
        let mut command = Command::new(&program);
        command.args(config.args()).stdin(reader);
        // Own process group: a terminal Ctrl-C must not reach the encoder,
        // only the session decides when its input ends.
        #[cfg(unix)]
        command.process_group(0);

        log::info!(
            "encoder: spawning {} ({} @ {}fps) -> {}",
            program,
            config.size,
            config.fps,
            config.output().display()
        );
        log::debug!("encoder: args {:?}", config.args());

        let child = command
            .spawn()
            .map_err(|source| spawn_error(&program, source))?;
        // The command holds the parent's copy of the read end.
        drop(command);

        log::info!("encoder: started pid {}", child.id());

        Ok(Self {
            config,
            frame_len,
            child,
            writer: Some(writer),
            state: SessionState::Open,
            failed_at: None,
            frames_sent: 0,
            bytes_written: 0,
        })
    }

    /// Writes one RGBA frame of exactly [`Session::frame_len`] bytes.
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        if let Some(frame) = self.failed_at {
            return Err(EncoderError::StreamFailed { frame });
        }
        let writer = match self.writer.as_mut() {
            Some(writer) if self.state != SessionState::Closed => writer,
            _ => return Err(EncoderError::SessionClosed),
        };

        if frame.len() != self.frame_len {
            return Err(EncoderError::InvalidFrameSize {
                expected: self.frame_len,
                actual: frame.len(),
            });
        }

        // write_all retries short and interrupted writes
        if let Err(source) = writer.write_all(frame) {
            // Part of the frame may already be in the pipe, so nothing
            // written after it could be framed correctly.
            drop(self.writer.take());
            self.failed_at = Some(self.frames_sent);
            log::error!(
                "encoder: write of frame {} failed: {}",
                self.frames_sent,
                source
            );
            return Err(EncoderError::FrameWrite {
                frame: self.frames_sent,
                source,
            });
        }

        self.frames_sent += 1;
        self.bytes_written += frame.len() as u64;
        self.state = SessionState::Sending;
        log::trace!("encoder: frame {} written", self.frames_sent);
        Ok(())
    }

    /// Closes the pipe and blocks until the encoder exits.
    pub fn close(&mut self) -> Result<()> {
        self.begin_close()?;
        let status = self.child.wait().map_err(EncoderError::Wait)?;
        self.finish(status)
    }

    /// Like [`Session::close`], but kills the encoder if it has not exited
    /// within `timeout`.
    pub fn close_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.begin_close()?;
        match wait_deadline(&mut self.child, timeout)? {
            Some(status) => self.finish(status),
            None => {
                log::warn!(
                    "encoder: pid {} still running after {:?}, killing",
                    self.child.id(),
                    timeout
                );
                kill_and_reap(&mut self.child)?;
                Err(EncoderError::EncoderTimedOut(timeout))
            }
        }
    }

    fn begin_close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(EncoderError::SessionClosed);
        }
        // end of input for the encoder
        drop(self.writer.take());
        self.state = SessionState::Closed;
        log::info!(
            "encoder: closing pid {} after {} frames ({} bytes)",
            self.child.id(),
            self.frames_sent,
            self.bytes_written
        );
        Ok(())
    }

    fn finish(&self, status: ExitStatus) -> Result<()> {
        if status.success() {
            log::info!("encoder: pid {} exited cleanly", self.child.id());
            Ok(())
        } else {
            log::error!("encoder: pid {} exited with {}", self.child.id(), status);
            Err(EncoderError::EncoderExitedAbnormally {
                code: status.code(),
            })
        }
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn size(&self) -> FrameSize {
        self.config.size
    }

    pub fn width(&self) -> u32 {
        self.config.size.width
    }

    pub fn height(&self) -> u32 {
        self.config.size.height
    }

    pub fn fps(&self) -> u32 {
        self.config.fps
    }

    /// Bytes every frame passed to [`Session::send_frame`] must have.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// A frame write failed; later sends are refused until close.
    pub fn is_failed(&self) -> bool {
        self.failed_at.is_some()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        log::warn!(
            "encoder: session for pid {} dropped without close",
            self.child.id()
        );
        drop(self.writer.take());
        self.state = SessionState::Closed;

        match wait_deadline(&mut self.child, DROP_GRACE) {
            Ok(Some(status)) => {
                log::debug!("encoder: pid {} exited with {}", self.child.id(), status)
            }
            Ok(None) | Err(_) => {
                if let Err(e) = kill_and_reap(&mut self.child) {
                    log::error!("encoder: failed to kill pid {}: {}", self.child.id(), e);
                }
            }
        }
    }
}

/// Polls the child until it exits or `timeout` passes. `None` on timeout.
fn wait_deadline(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(EncoderError::Wait)? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

fn kill_and_reap(child: &mut Child) -> Result<()> {
    // InvalidInput means it already exited
    match child.kill() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
        Err(e) => return Err(EncoderError::Wait(e)),
    }
    child.wait().map_err(EncoderError::Wait)?;
    Ok(())
}

#[cfg(all(test, unix))]
#[path = "session_test.rs"]
mod session_test;
