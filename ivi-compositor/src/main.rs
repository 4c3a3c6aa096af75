// IVI layer manager daemon entry point

mod cli;
mod plugins;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ivi_core::{init_logging, init_minimal_logging, CompositorConfig, ConfigLoader};
use ivi_layermanager::{CommandExecutor, Layermanager, PluginContext};
use ivi_plugin_manager::{PluginManager, StaticRegistry};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{debug, error, info, warn};

use crate::cli::Cli;

/// How often queued notifications are handed to the communicators.
const DISPATCH_INTERVAL: Duration = Duration::from_millis(20);

fn load_config(cli: &Cli) -> Result<CompositorConfig> {
    let mut config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    ConfigLoader::validate_config(&mut config).context("Invalid command line override")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            // Without a valid configuration there is no logging setup to honour.
            init_minimal_logging();
            error!("{:#}", e);
            return Err(e);
        }
    };
    init_logging(&config.logging, false).context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        width = config.display.width,
        height = config.display.height,
        display = %config.display.name,
        "Starting IVI layer manager"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .with_context(|| format!("Failed to register handler for signal {}", signal))?;
    }

    // Declared first so it is dropped last, on early returns as well.
    let mut registry = StaticRegistry::new();
    plugins::register_builtin_plugins(&mut registry);
    let mut plugin_manager = PluginManager::new(registry);

    // Plugin factories receive a weak reference, so the layer manager exists
    // before its plugins and receives them afterwards.
    let layermanager = Arc::new(Layermanager::new(config.display.clone()));
    let executor: Weak<dyn CommandExecutor> = Arc::downgrade(&layermanager) as Weak<dyn CommandExecutor>;
    let context = PluginContext::new(executor, Arc::clone(&config));

    let loaded = plugin_manager.load_plugins(&context, &config.plugins);
    if !loaded.failures.is_empty() {
        warn!(skipped = loaded.failures.len(), "Some plugins were not loaded");
    }
    layermanager.install_plugins(loaded.handles);

    layermanager.start_management().context("Failed to start layer management")?;
    info!(plugins = layermanager.plugins().len(), "Layer manager running");

    while !shutdown.load(Ordering::Relaxed) {
        let delivered = layermanager.dispatch_notifications();
        if delivered > 0 {
            debug!(delivered, "Dispatched notifications");
        }
        thread::sleep(DISPATCH_INTERVAL);
    }

    info!("Shutdown requested");
    layermanager.stop_management();

    // Plugin code from loaded modules must stay mapped until every handle is gone.
    drop(context);
    drop(layermanager);
    drop(plugin_manager);

    info!("IVI layer manager stopped");
    Ok(())
}
