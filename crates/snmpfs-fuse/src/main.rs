//! snmpmount - Mount an SNMP agent's MIB tree as a read-only directory.
//!
//! Usage: snmpmount <MOUNTPOINT> <AGENT> [--community <c>] [--base-oid <oid>]
//!
//! The agent is walked once at startup; the mounted files never change
//! afterwards. Unmount with Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use snmpfs_core::{CacheManager, Oid, SnmpConfig, SnmpV2cTransport};
use snmpfs_fuse::{FuseBackend, MountConfig, SnmpFS};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "snmpmount")]
#[command(about = "Mount an SNMP agent's MIB tree as a read-only FUSE filesystem")]
#[command(version)]
struct Cli {
    /// Mountpoint for the filesystem
    mountpoint: PathBuf,

    /// Agent address, `host` or `host:port` (port defaults to 161)
    agent: String,

    /// SNMPv2c community string
    #[arg(short, long, env = "SNMPFS_COMMUNITY", default_value = "public")]
    community: String,

    /// Timeout for a single request
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    timeout: Duration,

    /// Timeout for the complete startup walk
    #[arg(long, value_parser = humantime::parse_duration, default_value = "2m")]
    walk_timeout: Duration,

    /// Retries per request after a timeout
    #[arg(long, default_value_t = 0)]
    retries: usize,

    /// Repetitions requested per GETBULK round trip
    #[arg(long, default_value_t = snmpfs_core::config::DEFAULT_MAX_REPETITIONS)]
    max_repetitions: u32,

    /// Root of the subtree to expose
    #[arg(long, default_value = snmpfs_core::config::DEFAULT_BASE_OID)]
    base_oid: Oid,

    /// How long the kernel may cache attributes and lookups
    #[arg(long, value_parser = humantime::parse_duration, default_value = "60s")]
    attr_ttl: Duration,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    if !cli.mountpoint.exists() {
        anyhow::bail!("Mountpoint does not exist: {}", cli.mountpoint.display());
    }

    let cache = load_cache(&cli)?;
    mount_and_wait(&cli, cache)
}

/// Walks the agent once and returns the serving cache.
fn load_cache(cli: &Cli) -> Result<Arc<CacheManager>> {
    let config = SnmpConfig::new(cli.agent.clone())
        .community(cli.community.clone())
        .timeout(cli.timeout)
        .walk_timeout(cli.walk_timeout)
        .retries(cli.retries)
        .max_repetitions(cli.max_repetitions)
        .base_oid(cli.base_oid.clone());

    let transport = SnmpV2cTransport::connect(&config)
        .with_context(|| format!("Failed to connect to agent {}", cli.agent))?;

    info!(agent = %transport.agent(), base = %config.base_oid, "Walking agent");

    let cache = Arc::new(CacheManager::new());
    let walked = cache.load_walk(&transport, &config.base_oid);

    let requests = transport.stats();
    info!(
        started = requests.started,
        completed = requests.completed,
        timed_out = requests.timed_out,
        "Agent requests"
    );
    walked.with_context(|| format!("Failed to walk {} from {}", config.base_oid, transport.agent()))?;

    if cache.is_empty() {
        warn!(base = %config.base_oid, "Agent returned no entries; mounting an empty directory");
    }

    cache.mark_serving();
    Ok(cache)
}

/// Mount the filesystem and wait for Ctrl+C.
fn mount_and_wait(cli: &Cli, cache: Arc<CacheManager>) -> Result<()> {
    let mount_config = MountConfig::default()
        .attr_ttl(cli.attr_ttl)
        .fs_name(format!("snmp:{}", cli.agent));

    let (tx, rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to set signal handler")?;

    let fs = SnmpFS::new(cache, &mount_config);
    let backend = FuseBackend::with_timeouts(mount_config.mount_timeout, Duration::from_millis(50));
    let handle = backend
        .mount(fs, &cli.mountpoint, &mount_config)
        .with_context(|| format!("Failed to mount at {}", cli.mountpoint.display()))?;

    info!("Filesystem mounted at {} (press Ctrl+C to unmount)", handle.mountpoint().display());

    match rx.recv() {
        Ok(()) => info!("Received interrupt signal, unmounting..."),
        Err(_) => warn!("Signal channel closed unexpectedly"),
    }

    handle.unmount();
    info!("Filesystem unmounted");
    Ok(())
}
