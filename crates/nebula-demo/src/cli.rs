#![forbid(unsafe_code)]

//! Command-line argument parsing for the nebula binary.
//!
//! Parses args by hand. Values may be given as `--flag value` or
//! `--flag=value`. `NEBULA_*` environment variables supply defaults;
//! explicit flags override them.

use std::env;
use std::fmt;
use std::process;
use std::str::FromStr;

use nebula_core::{Config, ConfigError, Palette, SchedulePolicy};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
nebula: animated procedural nebula, rendered in parallel tiles

USAGE:
    nebula [OPTIONS]

OPTIONS:
    -w <int>                 Width in pixels (>= 160, default 640)
    -h <int>                 Height in pixels (>= 120, default 480)
    -n <int>                 Octaves (1..12, default 8)
    --seed <u32>             Noise seed (default 0)
    --lacunarity <f>         Frequency gain per octave (1.5..3.0)
    --persistence <f>        Amplitude gain per octave (0.05..0.95)
    --zspeed <f>             Time-to-depth scale (0..5)
    --palette <name>         seeded|nebula|inferno|ice|bw (default seeded)
    --render-scale <f>       Internal resolution scale (0.3..1.0)
    --schedule <name>        static|dynamic|guided|auto (default static)
    --chunk <int>            Scheduling chunk and tile size hint (1..512)
    --threads <int>          Worker threads, 0 = one per core (default 0)
    --seq                    Render on the calling thread only
    --frames <int>           Stop after N frames
    --exit-after-ms <int>    Stop after N milliseconds
    --present <mode>         terminal|none (default: terminal on a tty)
    --show-fps <0|1>         FPS line under the image (alias --title-fps)
    --log <directive>        Log filter, e.g. debug or nebula_runtime=trace
    --json-log               One JSON object per log line
    --help                   Show this help message
    --version, -V            Show version

KEYS (terminal mode):
    q / Esc / Ctrl+C         Quit

ENVIRONMENT VARIABLES:
    NEBULA_WIDTH, NEBULA_HEIGHT, NEBULA_OCTAVES, NEBULA_SEED,
    NEBULA_LACUNARITY, NEBULA_PERSISTENCE, NEBULA_ZSPEED, NEBULA_PALETTE,
    NEBULA_RENDER_SCALE, NEBULA_SCHEDULE, NEBULA_CHUNK, NEBULA_THREADS,
    NEBULA_FRAMES, NEBULA_EXIT_AFTER_MS, NEBULA_PRESENT, NEBULA_SHOW_FPS
                             Defaults for the matching flags
    NEBULA_LOG               Log filter when --log is not given";

/// Where frames go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    /// Compute only; log a checksum per frame.
    None,
    /// Half-block truecolor rendering in the alternate screen.
    Terminal,
}

impl FromStr for PresentMode {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "headless" => Ok(Self::None),
            "terminal" | "tty" => Ok(Self::Terminal),
            _ => Err(CliError::InvalidValue {
                flag: "--present",
                value: s.to_string(),
            }),
        }
    }
}

/// Argument errors. All of them end the process with exit code 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    MissingValue(&'static str),
    InvalidValue { flag: &'static str, value: String },
    Unknown(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue(flag) => write!(f, "missing value for {flag}"),
            Self::InvalidValue { flag, value } => write!(f, "invalid {flag} value: {value}"),
            Self::Unknown(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Render settings before range clamping. Schedule and palette are
    /// resolved separately because unknown names fall back with a warning.
    pub config: Config,
    pub schedule: Option<String>,
    pub palette: Option<String>,
    /// Render on the calling thread only.
    pub sequential: bool,
    /// Stop after this many frames.
    pub frames: Option<u64>,
    /// Stop after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
    /// `None` picks terminal output when stdout is a terminal.
    pub present: Option<PresentMode>,
    pub show_fps: bool,
    pub log: Option<String>,
    pub json_log: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: Config::default(),
            schedule: None,
            palette: None,
            sequential: false,
            frames: None,
            exit_after_ms: 0,
            present: None,
            show_fps: true,
            log: None,
            json_log: false,
        }
    }
}

/// Settings after name resolution and range clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub config: Config,
    /// Unknown schedule/palette names that were replaced by defaults.
    pub fallbacks: Vec<ConfigError>,
    /// Human-readable notes for values moved into range.
    pub adjustments: Vec<String>,
}

impl Opts {
    /// Parse `std::env::args()` and the process environment.
    ///
    /// Prints help or version and exits when asked; prints the error and
    /// exits with code 1 on bad input.
    pub fn parse() -> Self {
        match parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("nebula {VERSION}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Resolve palette and schedule names, then clamp every field.
    pub fn resolve(&self) -> Resolved {
        let mut config = self.config;
        let mut fallbacks = Vec::new();
        if let Some(name) = &self.schedule {
            match name.parse::<SchedulePolicy>() {
                Ok(policy) => config.schedule = policy,
                Err(e) => {
                    config.schedule = SchedulePolicy::default();
                    fallbacks.push(e);
                }
            }
        }
        if let Some(name) = &self.palette {
            match name.parse::<Palette>() {
                Ok(palette) => config.palette = palette,
                Err(e) => {
                    config.palette = Palette::default();
                    fallbacks.push(e);
                }
            }
        }
        let adjustments = config
            .clamp_to_valid_ranges()
            .into_iter()
            .map(|adj| adj.to_string())
            .collect();
        Resolved {
            config,
            fallbacks,
            adjustments,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

fn parse_num<T: FromStr>(flag: &'static str, value: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

/// Apply one `flag value` pair to `opts`.
fn apply(opts: &mut Opts, flag: &'static str, value: &str) -> Result<(), CliError> {
    let cfg = &mut opts.config;
    match flag {
        "-w" => cfg.width = parse_num(flag, value)?,
        "-h" => cfg.height = parse_num(flag, value)?,
        "-n" => cfg.octaves = parse_num(flag, value)?,
        "--seed" => cfg.seed = parse_num(flag, value)?,
        "--lacunarity" => cfg.lacunarity = parse_num(flag, value)?,
        "--persistence" => cfg.persistence = parse_num(flag, value)?,
        "--zspeed" => cfg.zspeed = parse_num(flag, value)?,
        "--render-scale" => cfg.render_scale = parse_num(flag, value)?,
        "--chunk" => cfg.chunk = parse_num(flag, value)?,
        "--threads" => cfg.threads = parse_num(flag, value)?,
        "--palette" => opts.palette = Some(value.to_string()),
        "--schedule" => opts.schedule = Some(value.to_string()),
        "--frames" => opts.frames = Some(parse_num(flag, value)?),
        "--exit-after-ms" => opts.exit_after_ms = parse_num(flag, value)?,
        "--present" => opts.present = Some(value.parse()?),
        "--show-fps" | "--title-fps" => opts.show_fps = parse_bool(value),
        "--log" => opts.log = Some(value.to_string()),
        _ => return Err(CliError::Unknown(flag.to_string())),
    }
    Ok(())
}

/// Flags that take a value, paired with their environment variable.
const VALUE_FLAGS: &[(&str, Option<&str>)] = &[
    ("-w", Some("NEBULA_WIDTH")),
    ("-h", Some("NEBULA_HEIGHT")),
    ("-n", Some("NEBULA_OCTAVES")),
    ("--seed", Some("NEBULA_SEED")),
    ("--lacunarity", Some("NEBULA_LACUNARITY")),
    ("--persistence", Some("NEBULA_PERSISTENCE")),
    ("--zspeed", Some("NEBULA_ZSPEED")),
    ("--palette", Some("NEBULA_PALETTE")),
    ("--render-scale", Some("NEBULA_RENDER_SCALE")),
    ("--schedule", Some("NEBULA_SCHEDULE")),
    ("--chunk", Some("NEBULA_CHUNK")),
    ("--threads", Some("NEBULA_THREADS")),
    ("--frames", Some("NEBULA_FRAMES")),
    ("--exit-after-ms", Some("NEBULA_EXIT_AFTER_MS")),
    ("--present", Some("NEBULA_PRESENT")),
    ("--show-fps", Some("NEBULA_SHOW_FPS")),
    ("--title-fps", None),
    ("--log", None),
];

fn value_flag(name: &str) -> Option<&'static str> {
    VALUE_FLAGS
        .iter()
        .map(|(flag, _)| *flag)
        .find(|flag| *flag == name)
}

/// Parse `args` (without the program name), reading defaults through `env`.
///
/// Unparsable environment values are ignored; unparsable flags are errors.
pub fn parse_from<I, S, E>(args: I, env: E) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    E: Fn(&str) -> Option<String>,
{
    let mut opts = Opts::default();

    for (flag, var) in VALUE_FLAGS {
        if let Some(var) = var
            && let Some(value) = env(var)
        {
            let _ = apply(&mut opts, flag, &value);
        }
    }

    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--seq" => opts.sequential = true,
            "--json-log" => opts.json_log = true,
            other => {
                let (name, inline) = match other.split_once('=') {
                    Some((name, value)) if name.starts_with("--") => (name, Some(value)),
                    _ => (other, None),
                };
                let flag = value_flag(name).ok_or_else(|| CliError::Unknown(other.to_string()))?;
                let value = match inline {
                    Some(value) => value,
                    None => {
                        i += 1;
                        args.get(i)
                            .map(String::as_str)
                            .ok_or(CliError::MissingValue(flag))?
                    }
                };
                apply(&mut opts, flag, value)?;
            }
        }
        i += 1;
    }

    Ok(Command::Run(opts))
}
