use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use wstunnel_service::{
    ForegroundServiceBridge, HeartbeatWorkload, HostContext, LogQueue, LogQueueMakeWriter,
    MethodCall, MethodChannel, MethodResponse, ServiceConfig, ServiceLifecycleController,
    ThreadedServiceHost,
};

#[derive(Parser, Debug)]
#[command(name = "wstunnel-service")]
#[command(about = "Start and stop the wstunnel foreground service over a method bridge")]
#[command(version)]
#[command(long_about = "Hosts the wstunnel foreground service behind a lifecycle controller. \
Method names (or JSON method calls) are read from stdin one per line, dispatched over the \
foreground service channel, and each reply is printed to stdout as JSON.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "wstunnel-service.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# wstunnel-service configuration file");
        println!("# Every value below is the default");
        println!();
        println!("{}", ServiceConfig::default().to_toml()?);
        return Ok(());
    }

    // Logging is configured from the loaded file, so the loader's own
    // messages are emitted before a subscriber exists
    let config = ServiceConfig::load_from_file(&args.config)?;

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    let log_queue = Arc::new(LogQueue::new(config.logging.queue_capacity));
    let log_guard = init_logging(&args, &config, Arc::clone(&log_queue))?;

    info!("Starting wstunnel-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded successfully from: {}", args.config);
    debug!("Final configuration: {:#?}", config);

    let host = ThreadedServiceHost::new(
        config.service.name.clone(),
        HeartbeatWorkload::new(config.heartbeat_interval()),
        config.stop_timeout(),
    );
    let controller = Arc::new(ServiceLifecycleController::new(host));
    let context = Arc::new(HostContext::from_config(&config));

    let mut channel = MethodChannel::new(config.service.channel.clone());
    ForegroundServiceBridge::new(Arc::clone(&controller), Arc::clone(&context))
        .with_log_queue(Arc::clone(&log_queue))
        .register(&mut channel);
    info!(
        "Channel '{}' ready with methods: {}",
        channel.name(),
        channel.methods().join(", ")
    );

    run_command_loop(Arc::new(channel)).await?;

    let result = tokio::task::spawn_blocking(move || controller.shutdown(&context)).await?;
    let exit_code = if result.success { 0 } else { 1 };

    info!("wstunnel-service exited with code: {}", exit_code);

    // Flush the file appender before exiting
    drop(log_guard);
    std::process::exit(exit_code);
}

/// Dispatch stdin lines until EOF or Ctrl+C
async fn run_command_loop(channel: Arc<MethodChannel>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT signal (Ctrl+C)");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            info!("Input closed, shutting down");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match MethodCall::parse(&line) {
            Ok(call) => {
                let channel = Arc::clone(&channel);
                tokio::task::spawn_blocking(move || channel.dispatch(&call)).await?
            }
            Err(e) => {
                warn!("Malformed method call '{}': {}", line.trim(), e);
                MethodResponse::error("INVALID_CALL", e.to_string())
            }
        };

        match serde_json::to_string(&response) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode response: {}", e),
        }
    }
}

fn init_logging(
    args: &Args,
    config: &ServiceConfig,
    log_queue: Arc<LogQueue>,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        config.logging.level.as_str()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wstunnel_service={}", log_level)));

    // Console output goes to stderr so stdout carries only responses
    let console_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        console_layer,
        fmt::layer()
            .with_writer(LogQueueMakeWriter::new(log_queue))
            .with_ansi(false)
            .with_target(false)
            .boxed(),
    ];

    let mut guard = None;
    if let Some(dir) = &config.logging.file {
        let appender = tracing_appender::rolling::daily(dir, "wstunnel-service.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed(),
        );
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    Ok(guard)
}
