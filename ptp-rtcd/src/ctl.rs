use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

use crate::daemon::{config::CliArg, tracing::LogLevel, Config, ObservableState};
use tracing_subscriber::util::SubscriberInitExt;

const USAGE_MSG: &str = "\
usage: ptp-rtc-ctl validate [-c PATH]
       ptp-rtc-ctl status [-f FORMAT] [-c PATH]
       ptp-rtc-ctl -h | ptp-rtc-ctl -v";

const DESCRIPTOR: &str = "ptp-rtc-ctl - ptp-rtcd monitoring";

const HELP_MSG: &str = "Options:
  -f, --format=FORMAT                  which format to use for printing the state [plain, json]
  -c, --config=CONFIG                  which configuration file to read the socket path from
  -h, --help                           display this help text
  -v, --version                        display version information";

const DEFAULT_OBSERVATION_PATH: &str = "/run/ptp-rtcd/observe";

pub fn long_help_message() -> String {
    format!("{DESCRIPTOR}\n\n{USAGE_MSG}\n\n{HELP_MSG}")
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
enum Format {
    #[default]
    Plain,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Format::Plain),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format '{other}', expected plain or json")),
        }
    }
}

/// What to do, in increasing order of precedence when several are asked for.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum PtpCtlAction {
    Status,
    Validate,
    Version,
    #[default]
    Help,
}

impl FromStr for PtpCtlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(PtpCtlAction::Status),
            "validate" => Ok(PtpCtlAction::Validate),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PtpCtlOptions {
    config: Option<PathBuf>,
    format: Format,
    action: PtpCtlAction,
}

impl PtpCtlOptions {
    const TAKES_ARGUMENT: &'static [&'static str] = &["--config", "--format"];
    const TAKES_ARGUMENT_SHORT: &'static [char] = &['c', 'f'];

    /// Parses the command line, the first item being the program name.
    /// Without a command or flag the help text is shown.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let args = iter.into_iter().map(|arg| arg.as_ref().to_owned());
        let mut options = PtpCtlOptions::default();
        let mut requested: Option<PtpCtlAction> = None;

        let parsed =
            CliArg::normalize_arguments(Self::TAKES_ARGUMENT, Self::TAKES_ARGUMENT_SHORT, args)?;
        for arg in parsed {
            let action = match arg {
                CliArg::Flag(flag) => match flag.as_str() {
                    "-h" | "--help" => PtpCtlAction::Help,
                    "-v" | "--version" => PtpCtlAction::Version,
                    other => return Err(format!("unknown option '{other}'")),
                },
                CliArg::Argument(option, value) => {
                    match option.as_str() {
                        "-c" | "--config" => options.config = Some(PathBuf::from(value)),
                        "-f" | "--format" => options.format = value.parse()?,
                        other => return Err(format!("unknown option '{other}'")),
                    }
                    continue;
                }
                CliArg::Rest(commands) => match commands.as_slice() {
                    [command] => command.parse()?,
                    _ => return Err(format!("expected one command, got {}", commands.len())),
                },
            };
            requested = requested.max(Some(action));
        }

        options.action = requested.unwrap_or_default();
        Ok(options)
    }
}

fn validate(config: Option<PathBuf>) -> ExitCode {
    // a subscriber may already be installed when running inside tests
    let _ = crate::daemon::tracing::tracing_init(LogLevel::Info).try_init();
    match Config::from_args(config) {
        Ok(config) => {
            if config.check() {
                eprintln!("Config looks good");
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: Could not load configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn main() -> std::io::Result<ExitCode> {
    let options = match PtpCtlOptions::try_parse_from(std::env::args()) {
        Ok(options) => options,
        Err(msg) => return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, msg)),
    };

    match options.action {
        PtpCtlAction::Help => {
            println!("{}", long_help_message());
            Ok(ExitCode::SUCCESS)
        }
        PtpCtlAction::Version => {
            eprintln!("ptp-rtc-ctl {VERSION}");
            Ok(ExitCode::SUCCESS)
        }
        PtpCtlAction::Validate => Ok(validate(options.config)),
        PtpCtlAction::Status => {
            let observation = match Config::from_args(options.config) {
                Ok(config) => config.observability.observation_path,
                Err(e) => {
                    eprintln!("Falling back to the default socket, config not loaded: {e}");
                    None
                }
            };
            let observation =
                observation.unwrap_or_else(|| PathBuf::from(DEFAULT_OBSERVATION_PATH));

            print_state(options.format, observation).await
        }
    }
}

fn print_plain(output: &ObservableState) {
    let port = &output.port;

    println!(
        "ptp-rtcd {}, up {:.0}s",
        output.program.version, output.program.uptime_seconds
    );
    println!();
    println!("Port {}:", port.identity);
    if !port.running {
        println!("    stopped");
        return;
    }
    println!("    role: {}", port.role);
    println!(
        "    peer capable: {}, link delay: {}ns, lost responses: {}",
        if port.peer_capable { "yes" } else { "no" },
        port.link_delay_ns,
        port.lost_responses,
    );

    let bmc = &port.current_bmc;
    println!();
    println!("Best master:");
    println!(
        "    grandmaster {} via {}, steps removed {}",
        bmc.grandmaster_identity, bmc.source_port_identity, bmc.steps_removed
    );
    println!(
        "    priority {}/{}, class {}, accuracy {:#04x}",
        bmc.priority_1,
        bmc.priority_2,
        bmc.clock_quality.clock_class,
        bmc.clock_quality.clock_accuracy,
    );

    match port.last_offset {
        Some(offset) => println!(
            "Last offset: {:+}ns (sync {})",
            offset.correction.offset_nanos(),
            offset.sequence_id
        ),
        None => println!("Last offset: none"),
    }
}

async fn fetch_state(observe_socket: &Path) -> std::io::Result<ObservableState> {
    let mut stream = tokio::net::UnixStream::connect(observe_socket).await?;
    let mut buffer = Vec::new();
    crate::daemon::sockets::read_json(&mut stream, &mut buffer).await
}

async fn print_state(format: Format, observe_socket: PathBuf) -> std::io::Result<ExitCode> {
    let state = match fetch_state(&observe_socket).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("No state available from {}: {e}", observe_socket.display());
            return Ok(ExitCode::FAILURE);
        }
    };

    match format {
        Format::Plain => print_plain(&state),
        Format::Json => match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Could not encode state as json: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use std::os::unix::prelude::PermissionsExt;

    use ptp_rtc::{InstanceConfig, PortConfig, PortSnapshot, Role};

    use crate::daemon::{
        config::ObservabilityConfig,
        observer::ProgramData,
        sockets::{create_unix_socket_with_permissions, tests::test_socket_path, write_json},
    };

    use super::*;

    fn observable_state() -> ObservableState {
        let port_config = PortConfig::default();
        ObservableState {
            program: ProgramData::default(),
            port: PortSnapshot {
                identity: InstanceConfig::default().port_identity(port_config.source_mac),
                role: Role::Master,
                running: true,
                peer_capable: false,
                current_bmc: Default::default(),
                link_delay_ns: 0,
                lost_responses: 2,
                last_offset: None,
            },
        }
    }

    async fn write_socket_helper(
        format: Format,
        socket_name: &str,
    ) -> std::io::Result<Result<ExitCode, std::io::Error>> {
        let config: ObservabilityConfig = Default::default();

        let path = test_socket_path(socket_name);
        let permissions: std::fs::Permissions =
            PermissionsExt::from_mode(config.observation_permissions);

        let listener = create_unix_socket_with_permissions(&path, permissions)?;
        let handle = tokio::spawn(super::print_state(format, path.clone()));

        let (mut stream, _addr) = listener.accept().await?;
        write_json(&mut stream, &observable_state()).await?;

        let result = handle.await.unwrap();
        std::fs::remove_file(&path)?;
        Ok(result)
    }

    #[tokio::test]
    async fn test_control_socket_plain() -> std::io::Result<()> {
        let result = write_socket_helper(Format::Plain, "ctl-plain").await?;
        assert_eq!(
            format!("{:?}", result.unwrap()),
            format!("{:?}", ExitCode::SUCCESS)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_control_socket_json() -> std::io::Result<()> {
        let result = write_socket_helper(Format::Json, "ctl-json").await?;
        assert_eq!(
            format!("{:?}", result.unwrap()),
            format!("{:?}", ExitCode::SUCCESS)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_control_socket_invalid_input() -> std::io::Result<()> {
        let path = test_socket_path("ctl-invalid");
        let permissions: std::fs::Permissions = PermissionsExt::from_mode(0o700);
        let listener = create_unix_socket_with_permissions(&path, permissions)?;

        let handle = tokio::spawn(super::print_state(Format::Plain, path.clone()));

        let (mut stream, _addr) = listener.accept().await?;
        write_json(&mut stream, &42u32).await?;

        let result = handle.await.unwrap();
        assert_eq!(
            format!("{:?}", result.unwrap()),
            format!("{:?}", ExitCode::FAILURE)
        );

        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[tokio::test]
    async fn missing_socket_fails() {
        let path = test_socket_path("ctl-missing");
        let result = print_state(Format::Plain, path).await;
        assert_eq!(
            format!("{:?}", result.unwrap()),
            format!("{:?}", ExitCode::FAILURE)
        );
    }

    const BINARY: &str = "/usr/bin/ptp-rtc-ctl";

    #[test]
    fn cli_config() {
        let config_str = "/foo/bar/ptp-rtcd.toml";
        let config = Path::new(config_str);
        let arguments = &[BINARY, "-c", config_str, "status"];

        let options = PtpCtlOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.config.unwrap().as_path(), config);
        assert_eq!(options.action, PtpCtlAction::Status);
    }

    #[test]
    fn cli_format() {
        let arguments = &[BINARY, "-f", "plain"];
        let options = PtpCtlOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.format, Format::Plain);

        let arguments = &[BINARY, "--format=json"];
        let options = PtpCtlOptions::try_parse_from(arguments).unwrap();
        assert_eq!(options.format, Format::Json);

        let arguments = &[BINARY, "-f", "yaml"];
        let err = PtpCtlOptions::try_parse_from(arguments).unwrap_err();
        assert_eq!(err, "unknown format 'yaml', expected plain or json");
    }

    #[test]
    fn cli_actions() {
        let options = PtpCtlOptions::try_parse_from([BINARY]).unwrap();
        assert_eq!(options.action, PtpCtlAction::Help);

        let options = PtpCtlOptions::try_parse_from([BINARY, "validate"]).unwrap();
        assert_eq!(options.action, PtpCtlAction::Validate);

        let options = PtpCtlOptions::try_parse_from([BINARY, "status", "-v"]).unwrap();
        assert_eq!(options.action, PtpCtlAction::Version);

        let options = PtpCtlOptions::try_parse_from([BINARY, "-v", "--help"]).unwrap();
        assert_eq!(options.action, PtpCtlAction::Help);

        assert!(PtpCtlOptions::try_parse_from([BINARY, "restart"]).is_err());
        assert!(PtpCtlOptions::try_parse_from([BINARY, "status", "validate"]).is_err());
        assert!(PtpCtlOptions::try_parse_from([BINARY, "--verbose"]).is_err());
    }

    #[test]
    fn validate_reports_broken_config() {
        let path = std::env::temp_dir().join(format!(
            "ptp-rtcd-test-{}-ctl-validate.toml",
            std::process::id()
        ));

        std::fs::write(&path, "[port]\nlink-delay-threshold-ns = 0\n").unwrap();
        assert_eq!(
            format!("{:?}", validate(Some(path.clone()))),
            format!("{:?}", ExitCode::FAILURE)
        );

        std::fs::write(&path, "[port]\nsync-interval = 4\n").unwrap();
        assert_eq!(
            format!("{:?}", validate(Some(path.clone()))),
            format!("{:?}", ExitCode::SUCCESS)
        );

        std::fs::write(&path, "[nonsense]\n").unwrap();
        assert_eq!(
            format!("{:?}", validate(Some(path.clone()))),
            format!("{:?}", ExitCode::FAILURE)
        );

        std::fs::remove_file(&path).unwrap();
    }
}
