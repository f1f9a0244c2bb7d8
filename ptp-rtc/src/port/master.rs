use super::{send_frame, Port};
use crate::{clock::Rtc, datastructures::common::Timestamp, network::Mac};

impl<M: Mac, R: Rtc> Port<M, R> {
    /// Sends a two-step Sync. The FollowUp goes out once the transmit
    /// timestamp of the Sync is known.
    pub(super) fn send_sync(&mut self) {
        self.sync_sent = false;
        self.frames.sync.inc_sequence_id();
        send_frame(&mut self.mac, &self.frames.sync);
    }

    pub(super) fn sync_transmitted(&mut self, tx_timestamp: Timestamp) {
        if self.sync_sent {
            return;
        }
        self.sync_sent = true;

        let sequence_id = self.frames.sync.sequence_id();
        let follow_up = &mut self.frames.follow_up;
        follow_up.set_precise_timestamp(tx_timestamp);
        follow_up.set_sequence_id(sequence_id);
        follow_up.set_correction_field(0);
        send_frame(&mut self.mac, &self.frames.follow_up);
    }
}
