//! Moving frames between the protocol driver and the wire

mod loopback;
#[cfg(target_os = "linux")]
mod raw_socket;

use std::time::Duration;

pub use loopback::{LoopbackPort, LoopbackSegment};
use ptp_rtc::{Frame, Mac, MacAddress, Rtc};
#[cfg(target_os = "linux")]
pub use raw_socket::RawEthernetSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace, warn};

use super::{
    clock::SharedRtc,
    config::{NetworkConfig, NetworkMode},
    system::PtpEvent,
};

/// Pause after a failing link operation, before the link is used again
const FAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Room for frames longer than anything the engine handles, so that those
/// are seen at their real length and rejected by the engine.
const RECEIVE_BUFFER_LEN: usize = 1518;

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("The interface name {0:?} is not valid")]
    InvalidInterfaceName(String),
    #[error("The specified interface {0} does not exist")]
    InterfaceDoesNotExist(String),
    #[error("Raw ethernet sockets are not supported on this platform")]
    Unsupported,
    #[error("The transmit queue is full")]
    QueueFull,
    #[error("The link was closed")]
    LinkClosed,
    #[error("Sent {sent} of {len} bytes")]
    ShortWrite { sent: usize, len: usize },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The [`Mac`] handed to the protocol engine. Frames are queued for the link
/// task, which sends them and reports their transmit timestamps back.
#[derive(Debug)]
pub struct ChannelMac {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChannelMac {
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        ChannelMac { sender }
    }
}

impl Mac for ChannelMac {
    type Error = NetworkError;

    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.sender
            .try_send(frame.to_vec())
            .map_err(|error| match error {
                TrySendError::Full(_) => NetworkError::QueueFull,
                TrySendError::Closed(_) => NetworkError::LinkClosed,
            })
    }
}

#[derive(Debug)]
pub enum Link {
    #[cfg(target_os = "linux")]
    Raw(RawEthernetSocket),
    Loopback(LoopbackPort),
}

impl Link {
    pub fn open(config: &NetworkConfig, multicast: MacAddress) -> Result<Link, NetworkError> {
        match config.mode {
            #[cfg(target_os = "linux")]
            NetworkMode::Raw => Ok(Link::Raw(RawEthernetSocket::open(
                &config.interface,
                multicast,
            )?)),
            #[cfg(not(target_os = "linux"))]
            NetworkMode::Raw => {
                let _ = multicast;
                Err(NetworkError::Unsupported)
            }
            NetworkMode::Loopback => Ok(Link::Loopback(LoopbackSegment::new().connect())),
        }
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), NetworkError> {
        match self {
            #[cfg(target_os = "linux")]
            Link::Raw(socket) => socket.send(frame).await,
            Link::Loopback(port) => port.send(frame),
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, NetworkError> {
        match self {
            #[cfg(target_os = "linux")]
            Link::Raw(socket) => socket.recv(buf).await,
            Link::Loopback(port) => port.recv(buf).await,
        }
    }
}

/// Sends queued frames and receives frames from the link. Both directions
/// are timestamped with the RTC as they pass, the results are reported to
/// the driver as events. Runs until the driver goes away.
pub async fn run_link(
    mut link: Link,
    rtc: SharedRtc,
    mut outgoing: mpsc::Receiver<Vec<u8>>,
    events: mpsc::Sender<PtpEvent>,
) {
    let mut buf = [0u8; RECEIVE_BUFFER_LEN];

    loop {
        let event = tokio::select! {
            frame = outgoing.recv() => {
                let Some(frame) = frame else {
                    debug!("driver stopped, closing link");
                    break;
                };

                match link.send(&frame).await {
                    Ok(()) => {
                        let timestamp = rtc.now();
                        match Frame::new(&frame) {
                            Ok(sent) => Some(PtpEvent::SendTimestamp {
                                message_type: sent.message_type(),
                                timestamp,
                            }),
                            Err(error) => {
                                warn!(%error, "sent a frame that is not a PTP message");
                                None
                            }
                        }
                    }
                    Err(error) => {
                        warn!(%error, "could not send frame");
                        Some(PtpEvent::Fault)
                    }
                }
            }
            received = link.recv(&mut buf) => match received {
                Ok(len) => {
                    let timestamp = rtc.now();
                    trace!(len, "received frame");
                    Some(PtpEvent::Receive {
                        data: buf[..len].to_vec(),
                        timestamp,
                    })
                }
                Err(error) => {
                    warn!(%error, "could not receive frame");
                    Some(PtpEvent::Fault)
                }
            },
        };

        let Some(event) = event else {
            continue;
        };
        let fault = matches!(event, PtpEvent::Fault);

        if events.send(event).await.is_err() {
            debug!("driver stopped, closing link");
            break;
        }

        if fault {
            tokio::time::sleep(FAULT_BACKOFF).await;
        }
    }
}
