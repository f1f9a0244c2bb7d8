use tracing::{debug, info};

use crate::{
    clock::Rtc,
    config::{InstanceConfig, PortConfig},
    datastructures::{
        common::{PortIdentity, Timestamp},
        messages::{Frame, MessageType},
    },
    network::Mac,
    port::{Port, PortSnapshot, Role},
};

/// Object that acts as the central point of this library.
/// It is the main instance of the running protocol.
///
/// The instance doesn't run on its own, but requires the user to invoke the
/// `handle_*` methods whenever required. It has exactly one port.
pub struct PtpInstance<M, R> {
    port: Port<M, R>,
}

impl<M: Mac, R: Rtc> PtpInstance<M, R> {
    /// Create a new, running instance
    ///
    /// - `instance_config`: identity and announced quality of the local clock
    /// - `port_config`: intervals, thresholds and addresses of the port
    /// - `mac`: where outgoing frames are handed off
    /// - `rtc`: the clock that is disciplined
    pub fn new(instance_config: InstanceConfig, port_config: PortConfig, mac: M, rtc: R) -> Self {
        let port = Port::new(instance_config, port_config, mac, rtc);
        info!(identity = %port.identity(), "started ptp instance");
        PtpInstance { port }
    }

    /// To be called once per configured tick interval
    pub fn handle_tick(&mut self) {
        self.port.handle_tick();
    }

    /// To be called for every frame received on the PTP EtherType, with the
    /// RTC time at which it arrived. Frames that are not valid PTP messages
    /// are dropped.
    pub fn handle_receive(&mut self, data: &[u8], rx_timestamp: Timestamp) {
        match Frame::new(data) {
            Ok(frame) => self.port.handle_frame(&frame, rx_timestamp),
            Err(error) => debug!(%error, "dropping frame"),
        }
    }

    /// To be called when the MAC reports the RTC time at which a frame of the
    /// given type left the wire.
    pub fn handle_send_timestamp(&mut self, message_type: MessageType, tx_timestamp: Timestamp) {
        self.port.handle_send_timestamp(message_type, tx_timestamp);
    }

    /// Clears all protocol state and starts over, as after a link fault.
    pub fn reset(&mut self) {
        info!("resetting ptp instance");
        self.port.stop();
        self.port.init();
    }

    pub fn stop(&mut self) {
        self.port.stop();
    }

    pub fn is_running(&self) -> bool {
        self.port.is_running()
    }

    pub fn port_identity(&self) -> PortIdentity {
        self.port.identity()
    }

    pub fn role(&self) -> Role {
        self.port.role()
    }

    pub fn snapshot(&self) -> PortSnapshot {
        self.port.snapshot()
    }

    pub fn rtc(&self) -> &R {
        self.port.rtc()
    }

    pub fn mac_mut(&mut self) -> &mut M {
        self.port.mac_mut()
    }
}
