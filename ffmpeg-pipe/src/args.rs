use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{EncoderError, Result};
use crate::frame::{FrameSize, INPUT_PIXEL_FORMAT};

pub const DEFAULT_PROGRAM: &str = "ffmpeg";
pub const DEFAULT_OUTPUT: &str = "output.mp4";

/// Output encoding parameters. The default is lossless x264.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodeProfile {
    // "libx264", "libx265", ...
    pub codec: String,
    // "veryslow", "medium", ...
    pub preset: String,
    pub crf: u32,
    // None = let crf drive the rate control
    pub qp: Option<u32>,
    // output pixel format, "yuv444p" keeps full chroma
    pub pixel_format: String,
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "veryslow".to_string(),
            crf: 0,
            qp: Some(0),
            pixel_format: "yuv444p".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CustomCommand {
    program: String,
    args: Vec<OsString>,
}

/// Session-scoped encoder configuration, read once by [`crate::Session::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub size: FrameSize,
    pub fps: u32,
    /// Executable looked up on `PATH`.
    pub program: String,
    pub log_level: String,
    /// Pass `-y` so an existing output file is overwritten.
    pub overwrite: bool,
    pub output: PathBuf,
    pub profile: EncodeProfile,
    custom: Option<CustomCommand>,
}

impl EncoderConfig {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            size: FrameSize::new(width, height),
            fps,
            program: DEFAULT_PROGRAM.to_string(),
            log_level: "info".to_string(),
            overwrite: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            profile: EncodeProfile::default(),
            custom: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_profile(mut self, profile: EncodeProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.profile.codec = codec.into();
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.profile.preset = preset.into();
        self
    }

    /// Replace the ffmpeg argument template with a complete command line.
    /// The program must still read `frame_len()`-sized RGBA frames from stdin.
    pub fn with_custom_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.custom = Some(CustomCommand {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.is_empty() {
            return Err(EncoderError::InvalidConfig(format!(
                "invalid frame size {}",
                self.size
            )));
        }
        if self.fps == 0 {
            return Err(EncoderError::InvalidConfig(
                "frame rate must be positive".to_string(),
            ));
        }
        if self.program().is_empty() {
            return Err(EncoderError::InvalidConfig(
                "encoder program is empty".to_string(),
            ));
        }
        self.size.len()?;
        Ok(())
    }

    pub fn program(&self) -> &str {
        match &self.custom {
            Some(custom) => &custom.program,
            None => &self.program,
        }
    }

    /// Arguments passed to [`Self::program`], without the program name.
    pub fn args(&self) -> Vec<OsString> {
        if let Some(custom) = &self.custom {
            return custom.args.clone();
        }

        let mut args: Vec<OsString> = vec!["-loglevel".into(), self.log_level.clone().into()];
        if self.overwrite {
            args.push("-y".into());
        }

        // input: raw RGBA frames on stdin
        args.extend(
            [
                "-f".to_string(),
                "rawvideo".to_string(),
                "-pix_fmt".to_string(),
                INPUT_PIXEL_FORMAT.to_string(),
                "-s".to_string(),
                self.size.resolution(),
                "-r".to_string(),
                self.fps.to_string(),
                "-i".to_string(),
                "-".to_string(),
            ]
            .map(OsString::from),
        );

        let profile = &self.profile;
        args.extend(
            [
                "-c:v".to_string(),
                profile.codec.clone(),
                "-preset".to_string(),
                profile.preset.clone(),
                "-crf".to_string(),
                profile.crf.to_string(),
            ]
            .map(OsString::from),
        );
        if let Some(qp) = profile.qp {
            args.push("-qp".into());
            args.push(qp.to_string().into());
        }
        args.push("-pix_fmt".into());
        args.push(profile.pixel_format.clone().into());
        args.push(self.output.clone().into_os_string());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template() {
        let args = EncoderConfig::new(1200, 800, 60).args();
        let expected = [
            "-loglevel",
            "info",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            "1200x800",
            "-r",
            "60",
            "-i",
            "-",
            "-c:v",
            "libx264",
            "-preset",
            "veryslow",
            "-crf",
            "0",
            "-qp",
            "0",
            "-pix_fmt",
            "yuv444p",
            "output.mp4",
        ];
        assert_eq!(args.len(), expected.len());
        for (arg, want) in args.iter().zip(expected) {
            assert_eq!(arg, want);
        }
    }

    #[test]
    fn test_program_defaults_to_ffmpeg() {
        let config = EncoderConfig::new(4, 2, 30);
        assert_eq!(config.program(), "ffmpeg");
        assert!(!config.is_custom());
    }

    #[test]
    fn test_custom_profile_and_output() {
        let profile = EncodeProfile {
            codec: "libx265".to_string(),
            preset: "fast".to_string(),
            crf: 18,
            qp: None,
            pixel_format: "yuv420p".to_string(),
        };
        let args = EncoderConfig::new(640, 480, 25)
            .with_profile(profile)
            .with_overwrite(false)
            .with_output("clips/take1.mkv")
            .args();

        assert!(!args.iter().any(|a| a == "-y"));
        assert!(!args.iter().any(|a| a == "-qp"));
        assert_eq!(args[args.len() - 1], "clips/take1.mkv");
        assert_eq!(args[args.len() - 2], "yuv420p");
        let codec = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[codec + 1], "libx265");
    }

    #[test]
    fn test_custom_command_replaces_template() {
        let config =
            EncoderConfig::new(4, 2, 30).with_custom_command("sh", ["-c", "cat > /dev/null"]);
        assert!(config.is_custom());
        assert_eq!(config.program(), "sh");
        let expected: Vec<OsString> = vec!["-c".into(), "cat > /dev/null".into()];
        assert_eq!(config.args(), expected);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(EncoderConfig::new(0, 2, 30).validate().is_err());
        assert!(EncoderConfig::new(4, 0, 30).validate().is_err());
        assert!(EncoderConfig::new(4, 2, 0).validate().is_err());
        let unnamed = EncoderConfig::new(4, 2, 30).with_program("");
        assert!(unnamed.validate().is_err());
        assert!(EncoderConfig::new(4, 2, 30).validate().is_ok());
    }
}
