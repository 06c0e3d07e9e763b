use std::path::Path;

use aura_media::check_ffmpeg;
use aura_worker::{BriefingConfig, GeminiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = BriefingConfig::from_env();

    println!(
        "briefing-selfcheck: starting with audio_dir={} video_dir={} work_dir={}",
        config.audio_output_dir.display(),
        config.video_output_dir.display(),
        config.work_dir.display()
    );
    for dir in [&config.audio_output_dir, &config.video_output_dir, &config.work_dir] {
        ensure_writable_dir(dir).await?;
    }

    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("ffmpeg not available: {}", e))?;
    println!("briefing-selfcheck: ffmpeg at {}", ffmpeg.display());

    if !GeminiConfig::from_env().is_configured() {
        return Err(anyhow::anyhow!("missing required env var GEMINI_API_KEY"));
    }

    println!("briefing-selfcheck: ok");
    Ok(())
}

async fn ensure_writable_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}
