//! The single PTP port of an instance: message handlers and the tick driven
//! state machine.

use tracing::{info, trace, warn};

pub use measurement::{link_delay, rtc_offset, RtcCorrection};
pub use state::{OffsetSnapshot, PortSnapshot, Role};

use self::{
    measurement::{RateRecords, TimestampRecords},
    sequence_id::SequenceIdRecords,
    ticker::Counters,
};
use crate::{
    bmc::BmcData,
    clock::Rtc,
    config::{InstanceConfig, PortConfig},
    datastructures::{
        common::{PortIdentity, Timestamp},
        messages::{Frame, FrameTemplate, MessageType, TxFrame, TxFrames},
    },
    network::Mac,
};

mod announce;
mod master;
mod measurement;
mod peer_delay;
mod sequence_id;
mod slave;
mod state;
mod ticker;

pub struct Port<M, R> {
    instance_config: InstanceConfig,
    config: PortConfig,
    identity: PortIdentity,
    mac: M,
    rtc: R,
    frames: TxFrames,
    current_bmc: BmcData,
    running: bool,
    peer_capable: bool,
    timestamps: TimestampRecords,
    sequence_ids: SequenceIdRecords,
    rate: RateRecords,
    counters: Counters,
    /// Sync receipt interval of the current master, in ticks
    sync_receipt_interval: u16,
    /// Cleared while a Sync waits for its transmit timestamp
    sync_sent: bool,
    /// Cleared while a PDelayResp waits for its transmit timestamp
    pdelay_resp_sent: bool,
    rcvd_pdelay_resp: bool,
    rcvd_pdelay_resp_follow_up: bool,
    pdelay_responder: PortIdentity,
    last_offset: Option<OffsetSnapshot>,
}

impl<M: Mac, R: Rtc> Port<M, R> {
    pub fn new(instance_config: InstanceConfig, config: PortConfig, mac: M, rtc: R) -> Self {
        let identity = instance_config.port_identity(config.source_mac);
        let frames = TxFrames::new(&frame_template(&instance_config, &config, identity));

        let mut port = Port {
            instance_config,
            config,
            identity,
            mac,
            rtc,
            frames,
            current_bmc: BmcData::default(),
            running: false,
            peer_capable: false,
            timestamps: TimestampRecords::default(),
            sequence_ids: SequenceIdRecords::default(),
            rate: RateRecords::default(),
            counters: Counters::default(),
            sync_receipt_interval: config.sync_interval,
            sync_sent: true,
            pdelay_resp_sent: true,
            rcvd_pdelay_resp: false,
            rcvd_pdelay_resp_follow_up: false,
            pdelay_responder: PortIdentity::default(),
            last_offset: None,
        };
        port.init();
        port
    }

    /// Puts the port in its initial state: master of its own time, peer not
    /// capable, all records cleared, and starts it.
    pub fn init(&mut self) {
        self.frames = TxFrames::new(&frame_template(
            &self.instance_config,
            &self.config,
            self.identity,
        ));
        self.timestamps = TimestampRecords::default();
        self.sequence_ids = SequenceIdRecords::default();
        self.rate = RateRecords::default();
        self.counters = Counters::default();
        self.sync_sent = true;
        self.pdelay_resp_sent = true;
        self.rcvd_pdelay_resp = false;
        self.rcvd_pdelay_resp_follow_up = false;
        self.pdelay_responder = PortIdentity::default();
        self.last_offset = None;

        self.become_master(false);
        self.peer_capable = false;
        self.current_bmc.announce_interval_duration = self.config.announce_interval;
        self.sync_receipt_interval = self.config.sync_interval;
        self.decode_tx_announce();

        self.running = true;
    }

    /// Stops reacting to ticks and frames until the next [`Port::init`].
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn identity(&self) -> PortIdentity {
        self.identity
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_master(&self) -> bool {
        self.current_bmc.i_am_master
    }

    pub fn role(&self) -> Role {
        if self.is_master() {
            Role::Master
        } else {
            Role::Slave
        }
    }

    pub fn is_peer_capable(&self) -> bool {
        self.peer_capable
    }

    pub fn current_bmc(&self) -> &BmcData {
        &self.current_bmc
    }

    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    pub fn mac_mut(&mut self) -> &mut M {
        &mut self.mac
    }

    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot {
            identity: self.identity,
            role: self.role(),
            running: self.running,
            peer_capable: self.peer_capable,
            current_bmc: self.current_bmc,
            link_delay_ns: self.timestamps.link_delay,
            lost_responses: self.counters.lost_responses,
            last_offset: self.last_offset,
        }
    }

    /// Advances all interval counters by one tick.
    pub fn handle_tick(&mut self) {
        if !self.running {
            return;
        }

        if self.peer_capable {
            if self.is_master() {
                self.master_tick();
            } else {
                self.slave_tick();
            }
        }

        let link_delay_interval = self.config.link_delay_interval;
        if link_delay_interval != 0 && self.counters.link_delay.tick(link_delay_interval - 1) {
            self.finish_pdelay_cycle();
            self.send_pdelay_req();
        }
    }

    fn master_tick(&mut self) {
        let sync_interval = self.config.sync_interval;
        if sync_interval != 0 && self.counters.sync.tick(sync_interval - 1) {
            self.send_sync();
        }

        let announce_interval = self.config.announce_interval;
        if announce_interval != 0 && self.counters.announce.tick(announce_interval - 1) {
            self.send_announce();
        }
    }

    fn slave_tick(&mut self) {
        let multiplier = self.config.receipt_timeout_multiplier;

        let announce_timeout =
            receipt_timeout(self.current_bmc.announce_interval_duration, multiplier);
        let announce_expired = self.counters.announce.tick(announce_timeout);

        let sync_timeout = receipt_timeout(self.sync_receipt_interval, multiplier);
        let sync_expired = self.counters.sync.tick(sync_timeout);

        if announce_expired {
            info!("announce receipt timeout");
        }
        if sync_expired {
            info!("sync receipt timeout");
        }
        if announce_expired || sync_expired {
            self.become_master(false);
        }
    }

    /// Dispatches a received frame to its handler.
    pub fn handle_frame(&mut self, frame: &Frame<'_>, rx_timestamp: Timestamp) {
        if !self.running {
            trace!("port stopped, ignoring frame");
            return;
        }

        match frame.message_type() {
            MessageType::Announce => self.handle_announce(frame),
            MessageType::Sync => self.handle_sync(frame, rx_timestamp),
            MessageType::FollowUp => self.handle_follow_up(frame),
            MessageType::PDelayReq => self.handle_pdelay_req(frame, rx_timestamp),
            MessageType::PDelayResp => self.handle_pdelay_resp(frame, rx_timestamp),
            MessageType::PDelayRespFollowUp => self.handle_pdelay_resp_follow_up(frame),
            // Signaling requests are not acted upon
            MessageType::Signaling => trace!("ignoring signaling message"),
        }
    }

    /// Handles the transmit timestamp of a frame sent earlier.
    pub fn handle_send_timestamp(&mut self, message_type: MessageType, tx_timestamp: Timestamp) {
        if !self.running {
            return;
        }

        match message_type {
            MessageType::Sync => self.sync_transmitted(tx_timestamp),
            MessageType::PDelayReq => self.timestamps.t1 = tx_timestamp.nanos,
            MessageType::PDelayResp => self.pdelay_resp_transmitted(tx_timestamp),
            _ => {}
        }
    }

    /// Takes on the master role. Unless the local announce data just won the
    /// BMCA, the best master record is reset to the local data first.
    fn become_master(&mut self, tx_announce_has_won: bool) {
        if !tx_announce_has_won {
            let local = BmcData::from_announce(&self.frames.announce.view());
            self.current_bmc.update_from(&local);
        }

        self.rtc.write_increment(self.config.nominal_increment());

        if !self.current_bmc.i_am_master {
            info!(identity = %self.identity, "becoming master");
            self.current_bmc.announce_interval_duration = self.config.announce_interval;
        }
        self.current_bmc.i_am_master = true;
    }

    fn become_slave(&mut self) {
        if self.current_bmc.i_am_master {
            info!(
                master = %self.current_bmc.source_port_identity,
                grandmaster = %self.current_bmc.grandmaster_identity,
                "becoming slave"
            );
        }
        self.counters.sync.reset();
        self.current_bmc.i_am_master = false;
    }

    fn change_peer_capability(&mut self, capable: bool) {
        if self.peer_capable != capable {
            info!(capable, "peer capability changed");
        }
        self.peer_capable = capable;
    }
}

/// Ticks a slave waits for a message that is expected every `interval` ticks.
/// A master sending at least once per tick still gets `multiplier` ticks.
fn receipt_timeout(interval: u16, multiplier: u16) -> u16 {
    interval.saturating_sub(1).max(1).saturating_mul(multiplier)
}

fn frame_template(
    instance_config: &InstanceConfig,
    config: &PortConfig,
    identity: PortIdentity,
) -> FrameTemplate {
    FrameTemplate {
        destination_mac: config.destination_mac,
        source_mac: config.source_mac,
        source_port_identity: identity,
        priority_1: instance_config.priority_1,
        priority_2: instance_config.priority_2,
        clock_quality: instance_config.clock_quality,
        time_source: instance_config.time_source,
        log_announce_interval: config.log_announce_interval(),
        log_sync_interval: config.log_sync_interval(),
    }
}

/// Fire and forget: a frame the MAC refuses is lost.
fn send_frame<M: Mac>(mac: &mut M, frame: &TxFrame) {
    match mac.send(frame.as_bytes()) {
        Ok(()) => trace!(message_type = ?frame.message_type(), "sent frame"),
        Err(error) => warn!(?error, message_type = ?frame.message_type(), "could not send frame"),
    }
}
