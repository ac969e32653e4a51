use std::path::PathBuf;
use std::time::Duration;

use ffmpeg_pipe::{EncoderConfig, EncoderError};
use tokio_util::sync::CancellationToken;

use super::record_with;

fn temp_output(name: &str) -> PathBuf {
    let file = format!("frame-recorder-{}-{}.raw", name, std::process::id());
    let path = std::env::temp_dir().join(file);
    if path.exists() {
        std::fs::remove_file(&path).unwrap();
    }
    path
}

fn cat_to(width: u32, height: u32, fps: u32, path: &PathBuf) -> EncoderConfig {
    EncoderConfig::new(width, height, fps).with_custom_command(
        "sh",
        [
            "-c".into(),
            "cat > \"$0\"".into(),
            path.clone().into_os_string(),
        ],
    )
}

#[test]
fn test_record_all_frames() -> anyhow::Result<()> {
    let path = temp_output("all");
    let summary = record_with(cat_to(32, 16, 30, &path), 30, None, CancellationToken::new())?;

    assert_eq!(summary.frames, 30);
    assert_eq!(summary.bytes, 30 * 32 * 16 * 4);
    assert!(!summary.cancelled);
    assert_eq!(std::fs::metadata(&path)?.len(), summary.bytes);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_record_with_close_timeout() -> anyhow::Result<()> {
    let path = temp_output("timeout");
    let summary = record_with(
        cat_to(8, 8, 10, &path),
        5,
        Some(Duration::from_secs(10)),
        CancellationToken::new(),
    )?;
    assert_eq!(summary.frames, 5);
    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn test_record_cancelled_before_start() -> anyhow::Result<()> {
    let path = temp_output("precancel");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = record_with(cat_to(8, 8, 10, &path), 100, None, cancel)?;
    assert!(summary.cancelled);
    assert_eq!(summary.frames, 0);
    // the encoder still saw a clean end of stream
    assert_eq!(std::fs::metadata(&path)?.len(), 0);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[tokio::test]
async fn test_record_cancelled_while_running() -> anyhow::Result<()> {
    let config =
        EncoderConfig::new(64, 64, 60).with_custom_command("sh", ["-c", "cat > /dev/null"]);
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    let handle =
        tokio::task::spawn_blocking(move || record_with(config, u64::MAX, None, cancel_clone));

    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let summary = handle.await??;
    assert!(summary.cancelled);
    assert_eq!(summary.bytes, summary.frames * 64 * 64 * 4);
    Ok(())
}

#[test]
fn test_record_encoder_failure() {
    let config = EncoderConfig::new(256, 256, 30).with_custom_command("sh", ["-c", "exit 0"]);
    let err = record_with(config, 10, None, CancellationToken::new()).unwrap_err();

    assert!(format!("{:#}", err).contains("send frame"));
    let source = err.downcast_ref::<EncoderError>().unwrap();
    assert!(source.is_broken_pipe());
}

#[test]
fn test_record_abnormal_exit() {
    let script = "cat > /dev/null; exit 2";
    let config = EncoderConfig::new(8, 8, 30).with_custom_command("sh", ["-c", script]);
    let err = record_with(config, 3, None, CancellationToken::new()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EncoderError>(),
        Some(EncoderError::EncoderExitedAbnormally { code: Some(2) })
    ));
}
