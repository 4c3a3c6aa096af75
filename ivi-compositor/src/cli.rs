//! Command line flags. They override the configuration file and the environment.

use std::path::PathBuf;

use clap::Parser;
use ivi_core::CompositorConfig;

#[derive(Debug, Parser)]
#[command(name = "ivi-layermanager", version, about = "IVI layer manager service")]
pub struct Cli {
    /// Configuration file, merged over the system configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Display width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Display height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Window-system display name handed to the renderers
    #[arg(long, value_name = "NAME")]
    pub display_name: Option<String>,

    /// Directory scanned for plugin modules
    #[arg(long, value_name = "DIR")]
    pub plugin_dir: Option<PathBuf>,

    /// Minimum log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Writes every given flag into `config`.
    pub fn apply_to(&self, config: &mut CompositorConfig) {
        if let Some(width) = self.width {
            config.display.width = width;
        }
        if let Some(height) = self.height {
            config.display.height = height;
        }
        if let Some(name) = &self.display_name {
            config.display.name = name.clone();
        }
        if let Some(dir) = &self.plugin_dir {
            config.plugins.directory = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
