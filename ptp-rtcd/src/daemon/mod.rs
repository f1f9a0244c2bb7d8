pub mod clock;
pub mod config;
pub mod network;
pub mod observer;
pub mod sockets;
pub mod system;
pub mod tracing;

use std::{error::Error, io::ErrorKind, path::PathBuf};

use ::tracing::{debug, error, info};
pub use config::Config;
pub use observer::ObservableState;
use tokio::runtime::Builder;
use tracing_subscriber::util::SubscriberInitExt;

use self::{
    clock::{SharedRtc, SoftwareRtc},
    config::{PtpDaemonAction, PtpDaemonOptions},
    network::{Link, NetworkError},
    tracing::LogLevel,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn main() -> Result<(), Box<dyn Error>> {
    let options = PtpDaemonOptions::try_parse_from(std::env::args())?;

    match options.action {
        PtpDaemonAction::Help => {
            println!("{}", config::long_help_message());
        }
        PtpDaemonAction::Version => {
            eprintln!("ptp-rtcd {VERSION}");
        }
        PtpDaemonAction::Run => run(options)?,
    }

    Ok(())
}

// initializes the logger so that logs during config parsing are reported. Then it overrides the
// log level based on the config if required.
pub(crate) fn initialize_logging_parse_config(
    initial_log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
) -> Config {
    let mut log_level = initial_log_level.unwrap_or_default();

    let config_tracing = self::tracing::tracing_init(log_level);
    let config = ::tracing::subscriber::with_default(config_tracing, || {
        match Config::from_args(config_path) {
            Ok(c) => c,
            Err(e) => {
                // print to stderr because tracing is not yet setup
                eprintln!("There was an error loading the config: {e}");
                std::process::exit(exitcode::CONFIG);
            }
        }
    });

    if let Some(config_log_level) = config.observability.log_level {
        if initial_log_level.is_none() {
            log_level = config_log_level;
        }
    }

    // set a default global subscriber from now on
    self::tracing::tracing_init(log_level).init();

    config
}

fn open_link(config: &Config) -> Link {
    match Link::open(&config.network, config.port.destination_mac) {
        Ok(link) => link,
        Err(NetworkError::IoError(e)) if e.kind() == ErrorKind::PermissionDenied => {
            error!(
                interface = %config.network.interface,
                "Opening a raw socket requires CAP_NET_RAW"
            );
            std::process::exit(exitcode::NOPERM);
        }
        Err(e) => {
            error!(interface = %config.network.interface, "Could not open the link: {e}");
            std::process::exit(exitcode::CONFIG);
        }
    }
}

fn run(options: PtpDaemonOptions) -> Result<(), Box<dyn Error>> {
    let config = initialize_logging_parse_config(options.log_level, options.config);

    let runtime = Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async {
        // give the user a warning that we use the command line option
        if config.observability.log_level.is_some() && options.log_level.is_some() {
            info!("Log level override from command line arguments is active");
        }

        // Warn if the config is unreasonable. We do this after finishing
        // tracing setup to ensure logging is fully configured.
        config.check();

        let rtc = SharedRtc::new(SoftwareRtc::new(config.port.nominal_increment()));
        let link = open_link(&config);

        debug!("Configuration loaded, spawning daemon jobs");
        let (main_loop_handle, channels) =
            system::spawn(config.instance, config.port, link, rtc);

        observer::spawn(&config.observability, channels.snapshot_receiver);

        main_loop_handle.await?;
        Ok::<(), Box<dyn Error>>(())
    })
}

pub(crate) mod exitcode {
    /// You did not have sufficient permission to perform
    /// the operation.  This is not intended for file system
    /// problems, which should use `NOINPUT` or `CANTCREAT`,
    /// but rather for higher level permissions.
    pub const NOPERM: i32 = 77;

    /// Something was found in an unconfigured or misconfigured state.
    pub const CONFIG: i32 = 78;
}
