use std::process::ExitCode;

use pseudo::cli::{self, ConfigFile};
use pseudo::config::Config;
use pseudo::host::{ConsoleHost, StopHandle};
use pseudo::script::Interpreter;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("pseudo: {e}");
            eprintln!("{}", cli::USAGE);
            return ExitCode::FAILURE;
        }
    };
    let Some(program) = args.program else {
        println!("{}", cli::USAGE);
        return ExitCode::SUCCESS;
    };

    // ── Load config ───────────────────────────────────────────────────────────
    // Problems are reported once logging is up.
    let mut notes: Vec<String> = Vec::new();
    let path = match args.config {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(path) => Some(path),
        ConfigFile::Search => cli::find_user_config(),
    };
    let mut config = match path {
        None => Config::default(),
        Some(path) => match Config::load_file(&path) {
            Ok((config, errors)) => {
                notes.extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
                config
            }
            Err(e) => {
                notes.push(format!("{}: {e}", path.display()));
                Config::default()
            }
        },
    };
    if args.max_steps.is_some() {
        config.max_steps = args.max_steps;
    }

    // ── Logging ───────────────────────────────────────────────────────────────
    // RUST_LOG wins; otherwise -d, then the config's log_level.
    let default_level = if args.debug {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    for note in &notes {
        warn!("config: {note}");
    }

    // ── Read program ──────────────────────────────────────────────────────────
    let src = match program.read() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("pseudo: cannot read program: {e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Run ───────────────────────────────────────────────────────────────────
    let mut host = ConsoleHost::new(config.input_prompt.clone());
    watch_interrupt(host.stop_handle());

    let mut interp = Interpreter::with_config(&src, &config);
    let result = interp.run(&mut host).await;
    if let Err(e) = &result {
        info!(steps = interp.steps(), line = e.line(), "run ended early");
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            eprintln!("pseudo: {e}");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("pseudo: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Set `stop` on SIGINT so the run ends at the next line boundary.
///
/// A second SIGINT while the program is blocked on input exits at once,
/// since the run loop cannot observe the flag until `get` returns.
fn watch_interrupt(stop: StopHandle) {
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!("cannot install interrupt handler: {e}");
            return;
        }
    };
    tokio::spawn(async move {
        while sigint.recv().await.is_some() {
            if stop.is_stopped() {
                std::process::exit(130);
            }
            info!("interrupt received, stopping");
            stop.stop();
        }
    });
}
