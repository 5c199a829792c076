use anyhow::Result;
use clap::Parser;
use democam::{
    CaptureCoordinator, ChannelNotifier, DemocamConfig, DevicePermissionProvider, HeadlessSurface,
    KeyboardInputHandler, NoticeDuration, PermissionProvider, SimulatedCameraPlatform, Size,
    StaticPermissionProvider,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "democam")]
#[command(about = "Single-screen camera: live preview, still capture and flash toggle")]
#[command(version)]
#[command(long_about = "Binds a preview and a still-capture use case to a capture screen, \
keeps the preview upright as the display rotates, and saves photos as timestamped JPEG files \
under the capture folder. Runs against a simulated camera with keyboard controls.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "democam.toml", help = "Path to TOML configuration file")]
    config: String,

    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without opening the screen")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Treat every permission as granted instead of probing the device
    #[arg(long, help = "Skip device and storage access checks")]
    assume_granted: bool,

    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args);

    info!("Starting democam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match DemocamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let (sensor_width, sensor_height) = config.camera.simulated_resolution;
    let camera = Arc::new(SimulatedCameraPlatform::new(Size::new(
        sensor_width,
        sensor_height,
    )));

    let (surface_width, surface_height) = config.surface.resolution;
    let surface = Arc::new(HeadlessSurface::new(
        Size::new(surface_width, surface_height),
        config.surface.rotation,
    ));

    let permissions: Arc<dyn PermissionProvider> = if args.assume_granted {
        Arc::new(StaticPermissionProvider::granting_all())
    } else {
        Arc::new(DevicePermissionProvider::new(
            config.camera.device.as_ref().map(PathBuf::from),
            PathBuf::from(&config.storage.root),
        ))
    };

    let (notifier, mut notices) = ChannelNotifier::new();
    let printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            // Raw mode needs an explicit carriage return
            match notice.duration {
                NoticeDuration::Short => print!("{}\r\n", notice.message),
                NoticeDuration::Long => print!(">> {}\r\n", notice.message),
            }
        }
    });

    let mut coordinator = CaptureCoordinator::builder()
        .config(config)
        .camera(camera)
        .permissions(permissions)
        .surface(surface.clone())
        .notifier(Arc::new(notifier))
        .build()?;

    let keyboard = if std::io::stdin().is_terminal() {
        let handler = KeyboardInputHandler::new(coordinator.events(), surface);
        handler.start().await?;
        Some(handler)
    } else {
        warn!("Standard input is not a terminal, keyboard controls disabled");
        None
    };

    let result = coordinator.run().await;

    if let Some(handler) = keyboard {
        handler.stop().await?;
    }
    drop(coordinator);
    printer.abort();

    let reason = result.map_err(|e| {
        error!("Capture screen failed: {}", e);
        e
    })?;

    info!("democam exited: {:?}", reason);
    std::process::exit(reason.exit_code());
}

fn init_logging(args: &Args) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("democam={}", log_level)));

    // Logs go to stderr so notices on stdout stay readable
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
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
        None => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# democam configuration file");
    println!("# Every key can be overridden with DEMOCAM__<SECTION>__<KEY>");
    println!();
    println!("{}", DemocamConfig::default().to_toml()?);
    Ok(())
}
