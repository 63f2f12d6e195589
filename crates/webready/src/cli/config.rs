//! The `webready config` command for configuration management.

use clap::{Args, Subcommand};
use std::path::Path;
use webready_core::Config;

/// Commented starter config written by `config init`. Parses to the same
/// values as `Config::default()`.
const CONFIG_TEMPLATE: &str = r#"# webready configuration
#
# Sizes are long-edge pixels. Presets: web (1920), portfolio (2048),
# instagram (1080), instagram-portrait (1350), instagram-story (1920).

[resize]
preset = "web"
# long_edge = 1600          # explicit target in pixels, overrides the preset
filter = "lanczos3"         # nearest, triangle, catmull-rom, lanczos3

[output]
format = "jpeg"             # jpeg or webp
quality = 85                # 1-100
progressive = true          # progressive JPEG scans
optimize = true             # extra encode time for smaller files
strip_metadata = true       # drop EXIF from outputs
suffix = "_web"             # appended to output filenames

[watermark]
enabled = false
path = ""                   # overlay image, e.g. "~/brand/logo.png"
position = "bottom-right"   # corner, edge-center, or center anchors
scale = 0.12                # fraction of the image's shorter edge
opacity = 0.7               # 0.0-1.0
margin = 24                 # pixels from the anchored edges
invert = false              # flip overlay colors for dark backgrounds

[logging]
level = "info"              # error, warn, info, debug, trace
format = "pretty"           # pretty or json
"#;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Write a commented starter config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            init_at(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Write the starter template to `path`, refusing to clobber an existing
/// file unless `force` is set.
fn init_at(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)?;
    Ok(())
}
