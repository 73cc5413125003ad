//! Run command - keeps the session cache alive until Ctrl-C.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use tracing::{info, warn};
use wagate_cache::TtlCache;
use wagate_session::{HttpGateway, SessionService, SessionState, StatsReporter};

use super::Context;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Sessions to check once at startup so their state is cached
    #[arg(long = "warm", value_name = "SESSION")]
    pub warm: Vec<String>,

    /// Seconds between stats reports (overrides `logging.stats_interval_secs`, 0 disables)
    #[arg(long)]
    pub stats_interval: Option<u64>,
}

/// Run the run command.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let settings = ctx.resolve_config().settings()?;

    let cache_config = &settings.cache;
    let gateway_config = &settings.gateway;
    let stats_interval = match args.stats_interval {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => settings.logging.stats_interval(),
    };

    let cache: TtlCache<SessionState> = TtlCache::new(cache_config.clone())?;
    let gateway =
        HttpGateway::new(&gateway_config.base_url)?.with_timeout(gateway_config.timeout());
    let service = SessionService::with_namespace(gateway, cache.clone(), settings.session);

    let reporter = stats_interval.map(|interval| StatsReporter::spawn("session", cache.clone(), interval));

    info!(
        gateway = %gateway_config.base_url,
        default_ttl_ms = cache_config.default_ttl.as_millis() as u64,
        cleanup = cache_config.enable_cleanup_task,
        "Session cache running"
    );

    for session in &args.warm {
        match service.status(session).await {
            Ok(state) => info!(session = %session, status = %state.status, "Warmed session"),
            Err(e) => warn!(session = %session, error = %e, "Could not warm session"),
        }
    }

    if !ctx.json_output {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("wagate session cache").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {} {}", dim.apply_to("Gateway:"), gateway_config.base_url);
        println!(
            "  {} {}s",
            dim.apply_to("Session TTL:"),
            settings.session.ttl().as_secs()
        );
        println!(
            "  {} {}",
            dim.apply_to("Sweep:"),
            if cache.is_sweeping() { "running" } else { "off" }
        );
        println!("  {} {}", dim.apply_to("Warmed:"), cache.len());
        println!();
        println!("{}", dim.apply_to("Press Ctrl-C to stop"));
    }

    tokio::signal::ctrl_c().await?;

    if let Some(reporter) = reporter {
        reporter.stop();
    }
    let stats = cache.stats();
    cache.destroy();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "Stopped. hits={} misses={} evicted={}",
            stats.hit_total, stats.miss_total, stats.evicted_total
        );
    }
    Ok(())
}
