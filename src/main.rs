use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use powerwatch::config::{LogSettings, Overrides, Settings};
use powerwatch::system::{StaticInfo, SystemCommand};
use powerwatch::ui::{Screen, Theme};
use powerwatch::{
    first_frame, run_dashboard, App, ExitReason, RecordSource, SamplerError, Shutdown,
    StreamSource, TelemetrySampler,
};

/// Environment variable holding a tracing filter, e.g. `powerwatch=debug`.
const LOG_ENV: &str = "POWERWATCH_LOG";

#[derive(Parser, Debug)]
#[command(name = "powerwatch")]
#[command(version, about = "Live terminal dashboard for Apple silicon power and utilization")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render interval (e.g. "250ms", "1s")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Telemetry sampling interval in milliseconds
    #[arg(short = 'i', long)]
    sample_interval: Option<u64>,

    /// Read telemetry from standard input instead of spawning powermetrics
    #[arg(long)]
    stdin: bool,

    /// Print the first frame as JSON and exit
    #[arg(long)]
    json: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("powerwatch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let overrides = Overrides {
        refresh: args.refresh.clone(),
        sample_interval_ms: args.sample_interval,
        log_file: args.log_file.clone(),
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;
    init_logging(&settings.logging)?;

    let refresh = settings.refresh_interval()?;
    let info = StaticInfo::new(
        Box::new(SystemCommand),
        settings.commands.clone(),
        settings.gpu_cache_ttl()?,
    );

    // The render loop stays on this thread; ingestion runs on the runtime.
    // Shut down in the background: a blocked stdin read would otherwise keep
    // the runtime alive.
    let rt = tokio::runtime::Runtime::new()?;
    let result = {
        let _guard = rt.enter();
        let shutdown = Shutdown::new();
        rt.spawn(watch_interrupt(shutdown.clone()));
        let result = start(&args, &settings, info, refresh, &shutdown);
        shutdown.trigger();
        result
    };
    rt.shutdown_background();
    result.map(ExitCode::from)
}

/// Start the record source and run the selected mode, returning the process
/// exit status. Must be called inside the runtime context.
fn start(
    args: &Args,
    settings: &Settings,
    info: StaticInfo,
    refresh: Duration,
    shutdown: &Shutdown,
) -> Result<u8> {
    let chunk_size = settings.telemetry.chunk_size;
    let source: Box<dyn RecordSource> = if args.stdin {
        Box::new(StreamSource::spawn(
            tokio::io::stdin(),
            "stdin",
            chunk_size,
            shutdown.clone(),
        ))
    } else {
        let command = settings.telemetry.command();
        match TelemetrySampler::start(&command, chunk_size, shutdown.clone()) {
            Ok(sampler) => Box::new(sampler),
            Err(e) => return Ok(fatal(&e)),
        }
    };

    if args.json {
        let mut app = App::new(source, info, Theme::dark());
        return print_first_frame(&mut app, shutdown, refresh);
    }

    let mut app = App::new(source, info, Theme::auto_detect());
    let reason = run_tui(&mut app, shutdown, refresh)?;
    if reason == ExitReason::SourceFailed {
        // The alternate screen is gone, so this stays visible
        if let Some(err) = app.source_error() {
            eprintln!("powerwatch: {}: {}", app.source_description(), err);
        }
    }
    Ok(reason.exit_code())
}

/// Turn Ctrl+C into a cooperative shutdown.
async fn watch_interrupt(shutdown: Shutdown) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("interrupt received");
                shutdown.trigger();
            }
            Err(e) => error!(error = %e, "failed to listen for Ctrl+C"),
        },
        _ = shutdown.triggered() => {}
    }
}

/// Report a startup failure. Nothing has been drawn yet, but the cursor is
/// shown anyway in case the terminal was left without one.
fn fatal(e: &SamplerError) -> u8 {
    error!(error = %e, "telemetry source failed to start");
    let _ = execute!(io::stdout(), Show);
    eprintln!("powerwatch: {}", e);
    1
}

fn run_tui(app: &mut App, shutdown: &Shutdown, refresh: Duration) -> Result<ExitReason> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        original_hook(panic);
    }));

    let result = Screen::new(CrosstermBackend::new(stdout))
        .and_then(|mut screen| run_dashboard(&mut screen, app, shutdown, refresh));

    execute!(io::stdout(), LeaveAlternateScreen)?;
    result
}

fn print_first_frame(app: &mut App, shutdown: &Shutdown, poll: Duration) -> Result<u8> {
    let Some(frame) = first_frame(app, shutdown, poll) else {
        if shutdown.is_triggered() {
            return Ok(0);
        }
        match app.source_error() {
            Some(err) => bail!("{} produced no record: {}", app.source_description(), err),
            None => bail!("{} closed before producing a record", app.source_description()),
        }
    };

    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(0)
}

/// Install a file logger. Stdout belongs to the dashboard, so without a log
/// file nothing is installed.
fn init_logging(settings: &LogSettings) -> Result<()> {
    let Some(path) = &settings.file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("invalid log level '{}'", settings.level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
