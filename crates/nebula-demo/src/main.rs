#![forbid(unsafe_code)]

//! `nebula`: renders the animated nebula to the terminal, or headless.

mod cli;
mod present;
mod signals;

use std::fmt;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use nebula_core::logging::{self, LogConfig, LogFormat};
use nebula_fx::NebulaFx;
use nebula_runtime::{
    ExecutionMode, FrameLoop, FrameScheduler, LoopLimits, RunError, RunSummary, SchedulerError,
    StopHandle,
};

use crate::cli::{Opts, PresentMode};
use crate::present::{HeadlessSink, TerminalSink};
use crate::signals::SignalGuard;

/// Errors that end the program with a failure exit code.
#[derive(Debug)]
enum AppError {
    Scheduler(SchedulerError),
    Run(RunError),
    Io(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduler(e) => write!(f, "{e}"),
            Self::Run(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scheduler(e) => Some(e),
            Self::Run(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<SchedulerError> for AppError {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

impl From<RunError> for AppError {
    fn from(e: RunError) -> Self {
        Self::Run(e)
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Logs share the tty with the image in terminal mode, so they are off
/// unless `--log` or `NEBULA_LOG` asks for them.
fn default_log_directive(present: PresentMode) -> &'static str {
    match present {
        PresentMode::None => "info",
        PresentMode::Terminal => "off",
    }
}

fn run(opts: &Opts, present: PresentMode) -> Result<RunSummary, AppError> {
    let resolved = opts.resolve();
    for fallback in &resolved.fallbacks {
        tracing::warn!(error = %fallback, "falling back to the default");
    }
    for adjustment in &resolved.adjustments {
        tracing::warn!(%adjustment, "config value out of range");
    }
    let config = resolved.config;

    let mode = if opts.sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Parallel
    };
    let scheduler = FrameScheduler::new(NebulaFx::new(&config), &config, mode)?;
    let limits = LoopLimits {
        max_frames: opts.frames,
        max_duration: (opts.exit_after_ms > 0).then(|| Duration::from_millis(opts.exit_after_ms)),
    };

    let stop = StopHandle::new();
    let _signals = SignalGuard::install(stop.clone())?;
    let mut frame_loop = FrameLoop::new(scheduler)
        .with_limits(limits)
        .with_stop_handle(stop.clone());

    let summary = match present {
        PresentMode::None => frame_loop.run(&mut HeadlessSink::new())?,
        PresentMode::Terminal => {
            let mut sink = TerminalSink::enter(stop, opts.show_fps)?;
            frame_loop.run(&mut sink)?
        }
    };
    Ok(summary)
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    let present = opts.present.unwrap_or(if io::stdout().is_terminal() {
        PresentMode::Terminal
    } else {
        PresentMode::None
    });

    let log = LogConfig {
        directive: opts.log.clone(),
        fallback: default_log_directive(present).to_string(),
        format: if opts.json_log {
            LogFormat::Json
        } else {
            LogFormat::Plain
        },
        span_timing: false,
    };
    if let Err(e) = logging::init(&log) {
        eprintln!("nebula: {e}");
        return ExitCode::FAILURE;
    }

    match run(&opts, present) {
        Ok(summary) => {
            if present == PresentMode::None {
                let checksum = summary
                    .last_checksum
                    .map_or_else(|| "-".to_string(), |c| format!("{c:016x}"));
                println!(
                    "frames={} elapsed_ms={} avg_fps={:.1} stop={} checksum={}",
                    summary.frames,
                    summary.elapsed.as_millis(),
                    summary.average_fps(),
                    summary.reason,
                    checksum
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "nebula failed");
            eprintln!("nebula: {e}");
            ExitCode::FAILURE
        }
    }
}
