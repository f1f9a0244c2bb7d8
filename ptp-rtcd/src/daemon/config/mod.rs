use std::{
    fmt::Display,
    io::{self, ErrorKind},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    str::FromStr,
};

use ptp_rtc::{InstanceConfig, PortConfig};
use serde::Deserialize;
use tracing::{info, warn};

use super::tracing::LogLevel;

const USAGE_MSG: &str = "\
usage: ptp-rtcd [-c PATH] [-l LOG_LEVEL]
       ptp-rtcd -h
       ptp-rtcd -v";

const DESCRIPTOR: &str = "ptp-rtcd - synchronize a real-time clock with PTP";

const HELP_MSG: &str = "Options:
  -c, --config=PATH             change the config .toml file
  -l, --log-level=LOG_LEVEL     change the log level
  -h, --help                    display this help text
  -v, --version                 display version information";

pub fn long_help_message() -> String {
    format!("{DESCRIPTOR}\n\n{USAGE_MSG}\n\n{HELP_MSG}")
}

const DEFAULT_CONFIG_PATH: &str = "/etc/ptp-rtcd/ptp-rtcd.toml";

#[derive(Debug, Default)]
pub(crate) struct PtpDaemonOptions {
    /// Path of the configuration file
    pub config: Option<PathBuf>,
    /// Level for messages to display in logs
    pub log_level: Option<LogLevel>,
    help: bool,
    version: bool,
    pub action: PtpDaemonAction,
}

/// A command line argument after splitting combined short options and
/// `--option=value` pairs.
pub enum CliArg {
    Flag(String),
    Argument(String, String),
    Rest(Vec<String>),
}

impl CliArg {
    /// Normalizes the raw arguments, the first of which is the program name.
    /// Options listed in `takes_argument` (long) and `takes_argument_short`
    /// consume a value, everything not starting with `-` is collected into a
    /// trailing [`CliArg::Rest`].
    pub fn normalize_arguments<I>(
        takes_argument: &[&str],
        takes_argument_short: &[char],
        iter: I,
    ) -> Result<Vec<Self>, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = iter.into_iter().skip(1);
        let mut processed = vec![];
        let mut rest = vec![];

        while let Some(arg) = args.next() {
            if arg == "--" {
                rest.extend(args.by_ref());
            } else if let Some(long) = arg.strip_prefix("--") {
                processed.push(Self::long_option(long, takes_argument, &mut args)?);
            } else if let Some(shorts) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
                Self::short_options(shorts, takes_argument_short, &mut args, &mut processed)?;
            } else {
                rest.push(arg);
            }
        }

        if !rest.is_empty() {
            processed.push(CliArg::Rest(rest));
        }

        Ok(processed)
    }

    fn long_option(
        option: &str,
        takes_argument: &[&str],
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, String> {
        if let Some((key, value)) = option.split_once('=') {
            let key = format!("--{key}");
            if !takes_argument.contains(&key.as_str()) {
                return Err(format!("invalid option: '--{option}'"));
            }
            return Ok(CliArg::Argument(key, value.to_string()));
        }

        let key = format!("--{option}");
        if !takes_argument.contains(&key.as_str()) {
            return Ok(CliArg::Flag(key));
        }

        match args.next() {
            Some(value) => Ok(CliArg::Argument(key, value)),
            None => Err(format!("'{key}' expects an argument")),
        }
    }

    /// `-vh` is two flags; in `-cfile.toml` the remainder after an option
    /// that takes an argument is its value.
    fn short_options(
        options: &str,
        takes_argument_short: &[char],
        args: &mut impl Iterator<Item = String>,
        processed: &mut Vec<Self>,
    ) -> Result<(), String> {
        for (index, option) in options.char_indices() {
            let flag = format!("-{option}");
            if !takes_argument_short.contains(&option) {
                processed.push(CliArg::Flag(flag));
                continue;
            }

            let inline = options[index + option.len_utf8()..].trim();
            if inline.starts_with('=') {
                return Err("invalid option '='".into());
            }

            let value = if inline.is_empty() {
                args.next()
                    .ok_or_else(|| format!("'{flag}' expects an argument"))?
            } else {
                inline.to_string()
            };
            processed.push(CliArg::Argument(flag, value));
            return Ok(());
        }

        Ok(())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum PtpDaemonAction {
    #[default]
    Help,
    Version,
    Run,
}

impl PtpDaemonOptions {
    const TAKES_ARGUMENT: &'static [&'static str] = &["--config", "--log-level"];
    const TAKES_ARGUMENT_SHORT: &'static [char] = &['c', 'l'];

    /// parse an iterator over command line arguments
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str> + Clone,
    {
        let mut options = PtpDaemonOptions::default();
        let arg_iter = CliArg::normalize_arguments(
            Self::TAKES_ARGUMENT,
            Self::TAKES_ARGUMENT_SHORT,
            iter.into_iter().map(|x| x.as_ref().to_string()),
        )?;

        for arg in arg_iter {
            match arg {
                CliArg::Flag(flag) => match flag.as_str() {
                    "-h" | "--help" => {
                        options.help = true;
                    }
                    "-v" | "--version" => {
                        options.version = true;
                    }
                    option => {
                        return Err(format!("invalid option provided: {option}"));
                    }
                },
                CliArg::Argument(option, value) => match option.as_str() {
                    "-c" | "--config" => {
                        options.config = Some(PathBuf::from(value));
                    }
                    "-l" | "--log-level" => match LogLevel::from_str(&value) {
                        Ok(level) => options.log_level = Some(level),
                        Err(_) => return Err("invalid log level".into()),
                    },
                    option => {
                        return Err(format!("invalid option provided: {option}"));
                    }
                },
                CliArg::Rest(_rest) => { /* do nothing, drop remaining arguments */ }
            }
        }

        options.resolve_action();

        Ok(options)
    }

    /// from the arguments resolve which action should be performed
    fn resolve_action(&mut self) {
        if self.help {
            self.action = PtpDaemonAction::Help;
        } else if self.version {
            self.action = PtpDaemonAction::Version;
        } else {
            self.action = PtpDaemonAction::Run;
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub observation_path: Option<PathBuf>,
    #[serde(default = "default_observation_permissions")]
    pub observation_permissions: u32,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Default::default(),
            observation_path: Default::default(),
            observation_permissions: default_observation_permissions(),
        }
    }
}

const fn default_observation_permissions() -> u32 {
    0o666
}

/// Where PTP frames are exchanged
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkMode {
    /// A raw Ethernet socket on a network interface
    #[default]
    Raw,
    /// An in-process segment without other members, for trying out a
    /// configuration
    Loopback,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default)]
    pub mode: NetworkMode,
    #[serde(default = "default_interface")]
    pub interface: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::default(),
            interface: default_interface(),
        }
    }
}

fn default_interface() -> String {
    "eth0".into()
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub instance: InstanceConfig,
    #[serde(default)]
    pub port: PortConfig,
}

impl Config {
    fn from_file(file: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let meta = std::fs::metadata(&file)?;
        let perm = meta.permissions();

        if perm.mode() as libc::mode_t & libc::S_IWOTH != 0 {
            warn!("Unrestricted config file permissions: Others can write.");
        }

        let contents = std::fs::read_to_string(file)?;
        Ok(toml::de::from_str(&contents)?)
    }

    /// Reads the given file, else the file at the default location if there
    /// is one, else uses the built-in defaults.
    pub fn from_args(file: Option<impl AsRef<Path>>) -> Result<Config, ConfigError> {
        // if an explicit file is given, always use that one
        if let Some(f) = file {
            let path: &Path = f.as_ref();
            info!(?path, "using config file");
            return Config::from_file(f);
        }

        // for the global file we also ignore it when there are permission errors
        let global_path = Path::new(DEFAULT_CONFIG_PATH);
        if global_path.exists() {
            info!("using config file at default location `{:?}`", global_path);
            match Config::from_file(global_path) {
                Err(ConfigError::Io(e)) if e.kind() == ErrorKind::PermissionDenied => {
                    info!("permission denied on global config file! using default config ...");
                }
                other => {
                    return other;
                }
            }
        }

        Ok(Config::default())
    }

    /// Check that the config is reasonable. Returns false when the daemon
    /// would run, but not do anything useful.
    pub fn check(&self) -> bool {
        let mut ok = true;
        let port = &self.port;

        if port.tick_interval_ms == 0 {
            warn!("The tick interval is zero, ticks will be as fast as the runtime allows.");
            ok = false;
        }

        if port.sync_interval == 0 || port.announce_interval == 0 {
            warn!("A zero sync or announce interval disables sending them as master.");
            ok = false;
        }

        if port.link_delay_interval == 0 {
            warn!("A zero link delay interval disables peer delay requests, the peer will never be capable.");
            ok = false;
        } else if port.link_delay_interval == 1 {
            warn!("The link delay interval is shorter than two ticks, responses will be counted as lost.");
            ok = false;
        }

        if port.link_delay_threshold_ns == 0 {
            warn!("A link delay threshold of zero rejects every measurement, the peer will never be capable.");
            ok = false;
        }

        if port.nominal_increment() == 0 {
            warn!(
                tsu_clock_hz = port.tsu_clock_hz,
                "The timestamping unit is faster than 1GHz, the RTC increment would be zero."
            );
            ok = false;
        }

        if port.max_lost_responses == 0 {
            warn!("With zero allowed lost responses the peer is never capable for long.");
        }

        if !port.destination_mac.is_multicast() {
            warn!(
                destination = %port.destination_mac,
                "The destination address is not a multicast address."
            );
        }

        if self.network.mode == NetworkMode::Loopback {
            info!("Loopback network mode: no frames will leave this process.");
        }

        ok
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
}

impl std::error::Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error while reading config: {e}"),
            Self::Toml(e) => write!(f, "config toml parsing error: {e}"),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}
