use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::info;

use readaloud_app::runtime::{self, RuntimeOptions};
use readaloud_app::settings::SettingsStore;
use readaloud_protocol::{Message, Reply};

/// Speak text through an OpenAI-compatible TTS endpoint.
#[derive(Parser, Debug)]
#[command(name = "readaloud", version, about)]
struct Cli {
    /// Text to read aloud. When omitted, the simulated page selection
    /// (--selection) is fetched the way the extension queries a tab.
    text: Option<String>,

    /// Simulated page selection, exercised via the content router.
    #[arg(long)]
    selection: Option<String>,

    /// Settings file (defaults to the per-user config dir).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the endpoint base URL for this run.
    #[arg(long)]
    api_url: Option<String>,

    /// Override the API key for this run.
    #[arg(long, env = "READALOUD_API_KEY")]
    api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    voice: Option<String>,

    #[arg(long)]
    speed: Option<f32>,

    #[arg(long)]
    volume: Option<f32>,

    /// Persist the effective configuration back to the settings file.
    #[arg(long)]
    save_config: bool,

    /// Enter through the context-menu path (host-supplied selection text)
    /// instead of the popup message path.
    #[arg(long, requires = "text")]
    menu: bool,

    /// Pretend the host cannot create an offscreen playback context, routing
    /// audio to the popup instead.
    #[arg(long)]
    no_offscreen: bool,
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_level).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = SettingsStore::new(
        cli.settings
            .clone()
            .unwrap_or_else(SettingsStore::default_path),
    );
    let mut config = store.load();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(voice) = cli.voice {
        config.voice = voice;
    }
    if let Some(speed) = cli.speed {
        config.speed = speed;
    }
    if let Some(volume) = cli.volume {
        config.volume = volume;
    }

    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "configuration saved");
    }

    let mut handle = runtime::start(RuntimeOptions {
        config,
        offscreen_supported: !cli.no_offscreen,
    });
    if let Some(selection) = &cli.selection {
        handle.selection.set(selection.clone());
    }

    if cli.menu {
        let text = cli.text.clone().unwrap_or_default();
        if text.trim().is_empty() {
            handle.shutdown().await;
            return Err(anyhow!("--menu needs non-empty selection text"));
        }
        // Fire-and-forget like a real menu click; failures are logged by the
        // background router and the idle broadcast still arrives.
        handle.context_menu(text);
        handle.wait_for_idle().await;
        handle.shutdown().await;
        return Ok(());
    }

    let result = handle
        .request(Message::ReadAloud {
            text: cli.text.clone(),
        })
        .await;
    match result {
        Ok(Reply::Ack { success: true, .. }) => {
            info!("playback started, waiting for it to finish");
            handle.wait_for_idle().await;
            handle.shutdown().await;
            Ok(())
        }
        Ok(Reply::Ack {
            success: false,
            error,
        }) => {
            handle.shutdown().await;
            Err(anyhow!(
                error.unwrap_or_else(|| "read aloud request failed".into())
            ))
        }
        Ok(other) => {
            handle.shutdown().await;
            Err(anyhow!("unexpected reply: {other:?}"))
        }
        Err(e) => {
            handle.shutdown().await;
            Err(anyhow!("background context unreachable: {e}"))
        }
    }
}
