use tracing::{debug, trace};

use super::{
    measurement::{link_delay, TimestampRecords},
    send_frame, Port,
};
use crate::{
    clock::Rtc,
    datastructures::{
        common::{compare_port_identity, Timestamp},
        messages::Frame,
    },
    network::Mac,
};

impl<M: Mac, R: Rtc> Port<M, R> {
    /// Answers a peer's PDelayReq. The PDelayRespFollowUp is prepared right
    /// away and sent once the PDelayResp transmit timestamp is known.
    pub(super) fn handle_pdelay_req(&mut self, frame: &Frame<'_>, rx_timestamp: Timestamp) {
        let requester = frame.source_port_identity();
        let sequence_id = frame.sequence_id();

        let response = &mut self.frames.pdelay_resp;
        response.set_precise_timestamp(rx_timestamp);
        response.set_sequence_id(sequence_id);
        response.set_requesting_port_identity(requester);

        let follow_up = &mut self.frames.pdelay_resp_follow_up;
        follow_up.set_sequence_id(sequence_id);
        follow_up.set_requesting_port_identity(requester);

        self.pdelay_resp_sent = false;
        send_frame(&mut self.mac, &self.frames.pdelay_resp);
    }

    pub(super) fn pdelay_resp_transmitted(&mut self, tx_timestamp: Timestamp) {
        if self.pdelay_resp_sent {
            return;
        }
        self.pdelay_resp_sent = true;

        self.frames
            .pdelay_resp_follow_up
            .set_precise_timestamp(tx_timestamp);
        send_frame(&mut self.mac, &self.frames.pdelay_resp_follow_up);
    }

    pub(super) fn handle_pdelay_resp(&mut self, frame: &Frame<'_>, rx_timestamp: Timestamp) {
        if self.rcvd_pdelay_resp {
            debug!("ignoring second response in this cycle");
            return;
        }

        let responder = frame.source_port_identity();
        if compare_port_identity(&responder, &self.identity) {
            // Our own request came back: there is no peer, just a loop
            debug!("received own response");
            self.change_peer_capability(false);
            return;
        }

        if !compare_port_identity(&frame.requesting_port_identity(), &self.identity) {
            trace!("ignoring response to another port");
            return;
        }

        if frame.sequence_id() != self.sequence_ids.pdelay_req {
            debug!(
                expected = self.sequence_ids.pdelay_req,
                actual = frame.sequence_id(),
                "ignoring response to an old request"
            );
            return;
        }

        self.rcvd_pdelay_resp = true;
        self.pdelay_responder = responder;
        self.sequence_ids.pdelay_resp = frame.sequence_id();
        self.timestamps.t2 = frame.precise_timestamp().nanos;
        self.timestamps.t4 = rx_timestamp.nanos;
    }

    pub(super) fn handle_pdelay_resp_follow_up(&mut self, frame: &Frame<'_>) {
        if !self.rcvd_pdelay_resp || self.rcvd_pdelay_resp_follow_up {
            debug!("ignoring unexpected response follow up");
            return;
        }

        if !compare_port_identity(&frame.source_port_identity(), &self.pdelay_responder)
            || !compare_port_identity(&frame.requesting_port_identity(), &self.identity)
            || frame.sequence_id() != self.sequence_ids.pdelay_resp
        {
            debug!("response follow up does not match the response");
            return;
        }

        self.rcvd_pdelay_resp_follow_up = true;
        self.timestamps.t3 = frame.precise_timestamp().nanos;
        self.calc_delay();
    }

    fn calc_delay(&mut self) {
        let TimestampRecords { t1, t2, t3, t4, .. } = self.timestamps;

        match link_delay(t1, t2, t3, t4) {
            Some(delay) if delay < self.config.link_delay_threshold_ns => {
                trace!(delay, "link delay");
                self.timestamps.link_delay = delay;
                self.change_peer_capability(true);
            }
            Some(delay) => debug!(delay, "discarding link delay above threshold"),
            None => debug!(t1, t2, t3, t4, "discarding negative link delay"),
        }
    }

    /// Accounts for the peer delay cycle that just ended and prepares a new
    /// one.
    pub(super) fn finish_pdelay_cycle(&mut self) {
        if self.rcvd_pdelay_resp && self.rcvd_pdelay_resp_follow_up {
            self.counters.lost_responses = 0;
        } else {
            self.counters.lost_responses = self.counters.lost_responses.saturating_add(1);
        }

        if self.counters.lost_responses >= self.config.max_lost_responses {
            self.change_peer_capability(false);
            self.counters.lost_responses = self.config.max_lost_responses;
        }

        self.rcvd_pdelay_resp = false;
        self.rcvd_pdelay_resp_follow_up = false;
    }

    pub(super) fn send_pdelay_req(&mut self) {
        self.sequence_ids.pdelay_req = self.frames.pdelay_req.inc_sequence_id();
        send_frame(&mut self.mac, &self.frames.pdelay_req);
    }
}
