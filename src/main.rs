// src/main.rs
mod engine;
mod logger;
mod signal;
mod tap;

use engine::AdaptiveBackoff;
use log::{error, info, LevelFilter};
use pollnet::endpoint::install_tasks;
use pollnet::{CancelToken, DhcpBootstrap, EndpointConfig, NetworkContext, NetworkInterface, Result, Scheduler};
use std::process::ExitCode;
use tap::TapDevice;

fn load_config() -> Result<EndpointConfig> {
    match std::env::args_os().nth(1) {
        Some(path) => EndpointConfig::load(path),
        None => Ok(EndpointConfig::default()),
    }
}

fn run(config: &EndpointConfig) -> Result<()> {
    let token = CancelToken::new();
    signal::spawn_watcher(token.clone())?;

    let mut tap = TapDevice::open(&config.interface, config.mac_address()?, config.checksum_offload)?;
    info!("[SYSTEM] Opened TAP device {} with MAC {}", tap.name(), tap.mac_address());

    if !engine::wait_for_link(&tap, config.link_timeout(), config.link_check_interval(), &token)? {
        return Ok(());
    }

    let mut ctx = NetworkContext::new(tap.mac_address());
    let mut bootstrap = DhcpBootstrap::new(config.hostname.as_str(), config.burst)
        .with_timeout(config.dhcp_timeout());
    let mut backoff = AdaptiveBackoff::new();
    if !bootstrap.run(&mut ctx, &mut tap, &token, || backoff.step(false))? {
        return Ok(());
    }

    let mut sched = Scheduler::new(config.burst);
    install_tasks(&mut sched, &ctx, &mut tap, config)?;
    engine::run(&mut tap, &mut sched, &ctx, &token)
}

fn main() -> ExitCode {
    logger::init(LevelFilter::Info);

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("[SYSTEM] {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Ok(level) = config.log_level_filter() {
        logger::init(level);
    }

    info!("[SYSTEM] Booting pollnet on {}...", config.interface);
    match run(&config) {
        Ok(()) => {
            info!("Bye...");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("[SYSTEM] {}", e);
            ExitCode::FAILURE
        }
    }
}
