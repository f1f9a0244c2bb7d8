use std::{os::unix::fs::PermissionsExt, time::Instant};

use ptp_rtc::PortSnapshot;
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tracing::warn;

use super::{
    config::ObservabilityConfig,
    sockets::{create_unix_socket_with_permissions, write_json},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ObservableState {
    pub program: ProgramData,
    pub port: PortSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgramData {
    pub version: String,
    pub uptime_seconds: f64,
}

impl ProgramData {
    pub fn with_uptime(uptime_seconds: f64) -> ProgramData {
        ProgramData {
            uptime_seconds,
            ..Default::default()
        }
    }
}

impl Default for ProgramData {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            uptime_seconds: 0.0,
        }
    }
}

pub fn spawn(
    config: &ObservabilityConfig,
    snapshot_reader: watch::Receiver<PortSnapshot>,
) -> JoinHandle<std::io::Result<()>> {
    let config = config.clone();
    tokio::spawn(async move {
        let result = observer(config, snapshot_reader).await;
        if let Err(ref e) = result {
            warn!("Abnormal termination of the state observer: {e}");
            warn!("The state observer will not be available");
        }
        result
    })
}

async fn observer(
    config: ObservabilityConfig,
    snapshot_reader: watch::Receiver<PortSnapshot>,
) -> std::io::Result<()> {
    let start_time = Instant::now();

    let Some(path) = config.observation_path else {
        return Ok(());
    };

    // the daemon runs privileged to open raw sockets, readers of the
    // socket should not have to
    let permissions: std::fs::Permissions =
        PermissionsExt::from_mode(config.observation_permissions);

    let listener = create_unix_socket_with_permissions(&path, permissions)?;

    loop {
        let (mut stream, _addr) = listener.accept().await?;

        let observe = ObservableState {
            program: ProgramData::with_uptime(start_time.elapsed().as_secs_f64()),
            port: *snapshot_reader.borrow(),
        };

        write_json(&mut stream, &observe).await?;
    }
}
