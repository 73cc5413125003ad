//! Probe command - checks a session through the cache.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;
use wagate_cache::{CacheStats, TtlCache};
use wagate_session::{HttpGateway, SessionService, SessionState};

use super::Context;

/// Arguments for the probe command.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Session name
    pub session: String,

    /// Start the session if it is not connected
    #[arg(long)]
    pub start: bool,

    /// Check the status this many times (repeats are served from cache)
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Gateway URL (overrides `gateway.base_url`)
    #[arg(long)]
    pub gateway: Option<String>,
}

/// Probe result for JSON output.
#[derive(Debug, Serialize)]
struct ProbeOutput {
    state: SessionState,
    cache: CacheStats,
}

/// Run the probe command.
pub async fn run(args: ProbeArgs, ctx: &Context) -> Result<()> {
    let settings = ctx.resolve_config().settings()?;
    let gateway_config = &settings.gateway;
    let base_url = args
        .gateway
        .unwrap_or_else(|| gateway_config.base_url.clone());

    let cache: TtlCache<SessionState> = TtlCache::new(settings.cache.clone().with_cleanup_task(false))?;
    let gateway = HttpGateway::new(&base_url)?.with_timeout(gateway_config.timeout());
    let service = SessionService::with_namespace(gateway, cache.clone(), settings.session);

    let mut state = service.status(&args.session).await?;
    for _ in 1..args.repeat {
        state = service.status(&args.session).await?;
    }
    if args.start && !state.is_connected() {
        state = service.create(&args.session).await?;
    }

    let stats = cache.stats();
    cache.destroy();

    if ctx.json_output {
        let output = ProbeOutput {
            state,
            cache: stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let status_style = if state.is_connected() {
        Style::new().green()
    } else {
        Style::new().yellow()
    };

    println!();
    println!("{}", style(format!("Session {}", args.session)).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Status:"), status_style.apply_to(state.status));
    println!("  {} {}", dim.apply_to("Checked:"), state.checked_at.to_rfc3339());
    if let Some(ref db_id) = state.db_id {
        println!("  {} {}", dim.apply_to("Db id:"), db_id);
    }
    if state.qr_code.is_some() {
        println!("  {} waiting for pairing", dim.apply_to("QR code:"));
    }
    if ctx.verbose {
        println!(
            "  {} {} hits / {} misses",
            dim.apply_to("Cache:"),
            stats.hit_total,
            stats.miss_total
        );
    }
    println!();
    Ok(())
}
