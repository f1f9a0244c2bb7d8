use tracing::{debug, trace};

use super::{send_frame, Port};
use crate::{
    bmc::BmcData,
    clock::Rtc,
    datastructures::{
        common::{compare_clock_identity, compare_port_identity},
        messages::Frame,
    },
    network::Mac,
};

impl<M: Mac, R: Rtc> Port<M, R> {
    pub(super) fn handle_announce(&mut self, frame: &Frame<'_>) {
        let announce = BmcData::from_announce(frame);

        if compare_port_identity(&announce.source_port_identity, &self.identity) {
            trace!("ignoring own announce");
            return;
        }

        if announce.steps_removed >= 255 {
            debug!(
                steps_removed = announce.steps_removed,
                "ignoring announce from too far away"
            );
            return;
        }

        if compare_clock_identity(
            &announce.grandmaster_identity,
            &self.current_bmc.grandmaster_identity,
        ) {
            // Fresh data from the grandmaster we already follow
            self.counters.announce.reset();
            self.current_bmc.update_from(&announce);
            self.decode_tx_announce();
        } else if self.is_master() && announce.is_better_than(&self.current_bmc) {
            self.current_bmc.update_from(&announce);
            self.current_bmc.announce_interval_duration = self
                .config
                .ticks_from_log_interval(frame.log_message_interval());
            self.become_slave();
        } else {
            trace!(grandmaster = %announce.grandmaster_identity, "announce did not win");
        }
    }

    /// Runs the BMCA of the local announce data against the best master
    /// record. The local data is committed when it wins, or when this port is
    /// master anyway.
    pub(super) fn decode_tx_announce(&mut self) {
        let local = BmcData::from_announce(&self.frames.announce.view());

        if local.is_better_than(&self.current_bmc) || self.is_master() {
            self.current_bmc.update_from(&local);
            self.become_master(true);
        }
    }

    pub(super) fn send_announce(&mut self) {
        self.frames.announce.inc_sequence_id();
        send_frame(&mut self.mac, &self.frames.announce);
    }
}
