use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Context;
use ffmpeg_pipe::{EncodeProfile, EncoderConfig};
use serde::Deserialize;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "FRAME_RECORDER_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncoderSection {
    pub program: String,
    pub log_level: String,
    pub codec: String,
    pub preset: String,
    pub crf: u32,
    pub qp: Option<u32>,
    pub pixel_format: String,
}

impl Default for EncoderSection {
    fn default() -> Self {
        let profile = EncodeProfile::default();
        Self {
            program: ffmpeg_pipe::args::DEFAULT_PROGRAM.to_string(),
            log_level: "info".to_string(),
            codec: profile.codec,
            preset: profile.preset,
            crf: profile.crf,
            qp: profile.qp,
            pixel_format: profile.pixel_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_secs: u32,
    pub output: PathBuf,
    // None = wait for the encoder indefinitely
    pub close_timeout_secs: Option<u64>,
    pub encoder: EncoderSection,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            fps: 60,
            duration_secs: 1,
            output: PathBuf::from(ffmpeg_pipe::args::DEFAULT_OUTPUT),
            close_timeout_secs: None,
            encoder: EncoderSection::default(),
        }
    }
}

impl RecorderConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.encoder_config().validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults if unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.fps as u64 * self.duration_secs as u64
    }

    pub fn close_timeout(&self) -> Option<Duration> {
        self.close_timeout_secs.map(Duration::from_secs)
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        let encoder = &self.encoder;
        EncoderConfig::new(self.width, self.height, self.fps)
            .with_program(encoder.program.clone())
            .with_log_level(encoder.log_level.clone())
            .with_output(self.output.clone())
            .with_profile(EncodeProfile {
                codec: encoder.codec.clone(),
                preset: encoder.preset.clone(),
                crf: encoder.crf,
                qp: encoder.qp,
                pixel_format: encoder.pixel_format.clone(),
            })
    }
}

pub fn config() -> &'static RecorderConfig {
    static CONFIG: LazyLock<RecorderConfig> = LazyLock::new(|| {
        RecorderConfig::from_env().unwrap_or_else(|e| {
            eprintln!("Error loading config: {:#}", e);
            std::process::exit(1);
        })
    });
    &CONFIG
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
