use chorda_core::config::Settings;
use chorda_core::expand::{health_check, ServiceConfig};
use std::path::Path;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chorda.json".to_string());
    let mut settings = Settings::load_or_default(Path::new(&config_path));
    settings.apply_env();

    info!("chorda starting (config: {})", config_path);
    info!(
        "alternate mode: {:?}, toggle hotkey: Alt+{:#04X}",
        settings.alternate_mode, settings.toggle_vk
    );
    if settings.endpoint.is_empty() {
        info!("no expansion endpoint configured, buffers will be echoed verbatim");
    } else {
        info!("expansion endpoint: {}", settings.endpoint);
        match health_check(&ServiceConfig::from(&settings)) {
            Ok(()) => info!("expansion service reachable"),
            Err(err) => warn!("expansion service health check failed: {}", err),
        }
    }
    info!("capture starts disabled; Ctrl+Alt+Esc is the emergency stop");

    run(settings)
}

#[cfg(windows)]
fn run(settings: Settings) -> anyhow::Result<()> {
    use chorda_core::types::Notification;
    use tracing::debug;

    chorda_core::hook::run(settings, |note| match note {
        Notification::EnabledChanged(true) => info!("capture enabled"),
        Notification::EnabledChanged(false) => info!("capture disabled"),
        Notification::ModeChanged(mode) => info!("mode: {:?}", mode),
        Notification::BufferChanged(text) => debug!("buffer: {}", text),
        Notification::ChordRejected => debug!("chord rejected"),
        Notification::ExpansionStarted => debug!("expansion requested"),
        Notification::ExpansionFailed(err) => warn!("expansion failed: {}", err),
        Notification::Reference(card) => println!("{}", card),
    })
}

#[cfg(not(windows))]
fn run(_settings: Settings) -> anyhow::Result<()> {
    tracing::error!("key capture requires the Windows low-level keyboard hook; exiting");
    Ok(())
}
