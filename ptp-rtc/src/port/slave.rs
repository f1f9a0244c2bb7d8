use tracing::{debug, trace};

use super::{measurement::rtc_offset, state::OffsetSnapshot, Port};
use crate::{
    clock::{AdjustWords, Rtc},
    datastructures::{
        common::{compare_port_identity, Timestamp},
        messages::Frame,
    },
    network::Mac,
};

/// Number of Sync/FollowUp pairs between rate records updates, minus one
const RATE_UPDATE_PAIRS: u8 = 0xf;

impl<M: Mac, R: Rtc> Port<M, R> {
    fn is_from_master(&self, frame: &Frame<'_>) -> bool {
        if self.is_master() {
            trace!(message_type = ?frame.message_type(), "ignoring, not a slave");
            return false;
        }

        if !compare_port_identity(
            &frame.source_port_identity(),
            &self.current_bmc.source_port_identity,
        ) {
            trace!(
                source = %frame.source_port_identity(),
                "ignoring, not from our master"
            );
            return false;
        }

        true
    }

    pub(super) fn handle_sync(&mut self, frame: &Frame<'_>, rx_timestamp: Timestamp) {
        if !self.is_from_master(frame) {
            return;
        }

        self.counters.sync.reset();
        self.timestamps.sync_rx = rx_timestamp;
        self.sequence_ids.sync = frame.sequence_id();
        self.sync_receipt_interval = self
            .config
            .ticks_from_log_interval(frame.log_message_interval());
    }

    pub(super) fn handle_follow_up(&mut self, frame: &Frame<'_>) {
        if !self.is_from_master(frame) {
            return;
        }

        if frame.sequence_id() != self.sequence_ids.sync {
            debug!(
                expected = self.sequence_ids.sync,
                actual = frame.sequence_id(),
                "follow up does not match the last sync"
            );
            return;
        }

        self.timestamps.correction = frame.correction_field();
        self.calc_rtc_offset(frame.precise_timestamp(), frame.sequence_id());

        if self.counters.sync_pairs & RATE_UPDATE_PAIRS == RATE_UPDATE_PAIRS {
            self.counters.sync_pairs = 0;
            self.rate.roll(self.sequence_ids.sync);
            self.update_rtc_increment();
        } else {
            self.counters.sync_pairs += 1;
        }
    }

    /// Steps the RTC onto the master time carried by a FollowUp.
    fn calc_rtc_offset(&mut self, origin: Timestamp, sequence_id: u16) {
        let correction = rtc_offset(
            origin,
            self.timestamps.correction,
            self.timestamps.link_delay,
            self.timestamps.sync_rx,
        );

        let seconds = self.rtc.read_seconds();
        self.rtc
            .write_seconds(seconds.wrapping_add_signed(correction.seconds_delta as i32));
        for word in AdjustWords::new(correction.nanos_delta, correction.subtract) {
            self.rtc.write_adjust(word);
        }

        self.rate.slave_time_new = correction.slave.nanos;
        self.rate.master_time_new = correction.master.nanos;

        debug!(
            sequence_id,
            offset_ns = correction.offset_nanos(),
            "corrected RTC"
        );
        self.last_offset = Some(OffsetSnapshot {
            sequence_id,
            correction,
        });
    }

    /// Frequency adjustment is not implemented: the RTC keeps running at its
    /// nominal increment.
    fn update_rtc_increment(&mut self) {
        trace!(
            slave_old = self.rate.slave_time_old,
            slave_new = self.rate.slave_time_new,
            master_old = self.rate.master_time_old,
            master_new = self.rate.master_time_new,
            "rate records updated"
        );
    }
}
