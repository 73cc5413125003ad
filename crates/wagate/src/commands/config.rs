//! Config command - configuration management.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::Style;
use serde_json::json;
use wagate_config::{LayerStatus, Section, WagateConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration (defaults filled in)
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Validate the resolved configuration
    Check,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./wagate.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Check => cmd_check(ctx),
        ConfigCommand::Init { local, force } => cmd_init(ctx, local, force),
        ConfigCommand::Path => cmd_path(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = ctx.resolve_config().effective();
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let resolved = ctx.resolve_config();

    if ctx.json_output {
        let layers: Vec<_> = resolved
            .layers
            .iter()
            .map(|layer| {
                let (status, reason) = match layer.status {
                    LayerStatus::Missing => ("missing", None),
                    LayerStatus::Loaded => ("loaded", None),
                    LayerStatus::Skipped(ref reason) => ("skipped", Some(reason.as_str())),
                };
                json!({
                    "kind": layer.kind.name(),
                    "path": layer.path,
                    "status": status,
                    "reason": reason,
                })
            })
            .collect();
        let sections: serde_json::Map<_, _> = Section::ALL
            .iter()
            .map(|&section| {
                let origin = resolved
                    .origin(section)
                    .map_or("default", |layer| layer.kind.name());
                (section.name().to_string(), json!(origin))
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "layers": layers, "sections": sections }))?
        );
        return Ok(());
    }

    let green = Style::new().green();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    println!("Config layers (lowest precedence first):");
    for layer in &resolved.layers {
        let status = match layer.status {
            LayerStatus::Missing => dim.apply_to("not found".to_string()),
            LayerStatus::Loaded => green.apply_to("loaded".to_string()),
            LayerStatus::Skipped(ref reason) => yellow.apply_to(format!("skipped: {reason}")),
        };
        println!(
            "  {:<8} {}  {}",
            layer.kind.name(),
            layer.path.display(),
            status
        );
    }

    println!();
    println!("Sections:");
    for section in Section::ALL {
        match resolved.origin(section) {
            Some(layer) => println!(
                "  {:<11} {} ({})",
                section.name(),
                layer.kind.name(),
                layer.path.display()
            ),
            None => println!("  {:<11} {}", section.name(), dim.apply_to("default")),
        }
    }
    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<()> {
    let settings = ctx.resolve_config().settings()?;
    let cache = &settings.cache;

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "valid": true,
                "default_ttl_ms": cache.default_ttl.as_millis() as u64,
                "cleanup_interval_ms": cache.cleanup_interval.as_millis() as u64,
                "session_ttl_ms": settings.session.ttl().as_millis() as u64,
                "credential_ttl_ms": settings.credential.ttl().as_millis() as u64,
            }))?
        );
    } else {
        println!("Configuration is valid");
        println!("  default TTL       {:?}", cache.default_ttl);
        println!(
            "  sweep             {}",
            if cache.enable_cleanup_task {
                format!("every {:?}", cache.cleanup_interval)
            } else {
                "disabled".to_string()
            }
        );
        println!("  session TTL       {:?}", settings.session.ttl());
        println!("  credential TTL    {:?}", settings.credential.ttl());
        println!("  gateway           {}", settings.gateway.base_url);
    }
    Ok(())
}

fn cmd_init(ctx: &Context, local: bool, force: bool) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from("wagate.toml")
    } else {
        match ctx.user_config_path() {
            Some(path) => path,
            None => bail!("Could not determine the user config directory"),
        }
    };

    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    wagate_config::save_config(&WagateConfig::with_defaults(), &path)?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    match ctx.user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => bail!("Could not determine the user config directory"),
    }
    Ok(())
}
