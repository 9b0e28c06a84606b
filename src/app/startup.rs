//! Application startup: arguments, logging, configuration, gateway run loop

use crate::app::cli::Args;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::gateway::{resolve_config_path, Gateway, GatewayConfig, GatewayResult};
use crate::module::static_modules;
use clap::Parser;

/// Entry point used by the binary; returns the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse();

    if args.list_modules {
        print_modules();
        return 0;
    }

    // Read the configuration before logging starts so its settings apply
    let config = load_config(&args).await;
    let logging = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();

    let log_level = args.log_level.as_deref().or(logging.level.as_deref());
    let log_format = args.log_format.as_deref().or(logging.format.as_deref());
    let log_file = args
        .log_file
        .as_ref()
        .or(logging.file.as_ref())
        .map(|path| path.to_string_lossy().to_string());
    if let Err(e) = init_logging(log_level, log_format, log_file.as_deref(), args.use_color()) {
        eprintln!("Error: cannot initialise logging: {}", e);
        return 1;
    }
    log::debug!("modgate {}", crate::core::version::long_version());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&e, "Loading gateway configuration");
            return 1;
        }
    };

    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    match run(&config, &shutdown).await {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "Running gateway");
            1
        }
    }
}

fn print_modules() {
    for entry in static_modules() {
        println!("{:<20} {}", entry.name, entry.symbol);
    }
}

async fn load_config(args: &Args) -> GatewayResult<GatewayConfig> {
    match resolve_config_path(args.config.clone())? {
        Some(path) => Ok(GatewayConfig::load(&path).await?),
        None => Ok(GatewayConfig::builtin_default()),
    }
}

/// Run a gateway for `config` until shutdown is requested
pub async fn run(config: &GatewayConfig, shutdown: &ShutdownCoordinator) -> GatewayResult<()> {
    let mut gateway = Gateway::from_config(config).await?;
    gateway.start()?;
    log::info!(
        "Gateway running with modules: {}",
        gateway.module_names().join(", ")
    );

    shutdown.wait().await;
    log::info!("Shutdown requested");
    gateway.shutdown().await;
    Ok(())
}
