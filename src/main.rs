use anyhow::Context;
use tokio_util::sync::CancellationToken;

mod config;
mod pattern;
mod recorder;

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pipe", log::LevelFilter::Debug)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = config::config();

    match ffmpeg_pipe::probe_version(&config.encoder.program) {
        Ok(version) => log::info!("encoder: {}", version),
        Err(e) => log::warn!("encoder probe failed: {}", e),
    }

    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    let mut recording =
        tokio::task::spawn_blocking(move || recorder::record(config, cancel_clone));

    let summary = tokio::select! {
        result = &mut recording => result.context("recorder task")??,
        _ = tokio::signal::ctrl_c() => {
            log::info!("ctrl+c received, finishing recording");
            cancel.cancel();
            recording.await.context("recorder task")??
        },
    };

    log::info!(
        "recorded {} frames ({} bytes) to {} in {:.2?}{}",
        summary.frames,
        summary.bytes,
        config.output.display(),
        summary.elapsed,
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    Ok(())
}
