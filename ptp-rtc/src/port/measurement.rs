use serde::{Deserialize, Serialize};

use crate::datastructures::common::{Timestamp, NANOS_PER_SECOND};

/// Timestamps gathered for the delay and offset calculations. The peer delay
/// values only hold the nanosecond part of their timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TimestampRecords {
    /// PDelayReq transmitted
    pub(crate) t1: u32,
    /// PDelayReq received by the peer
    pub(crate) t2: u32,
    /// PDelayResp transmitted by the peer
    pub(crate) t3: u32,
    /// PDelayResp received
    pub(crate) t4: u32,
    pub(crate) sync_rx: Timestamp,
    pub(crate) correction: u32,
    pub(crate) link_delay: u32,
}

/// Slave and master times of two Sync/FollowUp pairs some distance apart, the
/// input for a clock rate adjustment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RateRecords {
    pub(crate) slave_time_old: u32,
    pub(crate) slave_time_new: u32,
    pub(crate) master_time_old: u32,
    pub(crate) master_time_new: u32,
    pub(crate) sync_sequence_id_old: u16,
    pub(crate) sync_sequence_id_new: u16,
}

impl RateRecords {
    pub(crate) fn roll(&mut self, sync_sequence_id: u16) {
        self.slave_time_old = self.slave_time_new;
        self.master_time_old = self.master_time_new;
        self.sync_sequence_id_old = self.sync_sequence_id_new;
        self.sync_sequence_id_new = sync_sequence_id;
    }
}

/// Nanoseconds from `earlier` to `later` on a counter that wraps at one second.
fn elapsed(earlier: u32, later: u32) -> u64 {
    let later = if later < earlier {
        later as u64 + NANOS_PER_SECOND as u64
    } else {
        later as u64
    };
    later - earlier as u64
}

/// Mean link delay from a peer delay exchange:
/// `((t4 - t1) - (t3 - t2)) / 2`.
///
/// Only the nanosecond parts of the timestamps are used; a later timestamp
/// that is numerically smaller than the earlier one wrapped over a second
/// boundary. Returns `None` when the peer's turnaround time exceeds the round
/// trip time.
pub fn link_delay(t1: u32, t2: u32, t3: u32, t4: u32) -> Option<u32> {
    let round_trip = elapsed(t1, t4);
    let turnaround = elapsed(t2, t3);

    round_trip
        .checked_sub(turnaround)
        .and_then(|twice_delay| u32::try_from(twice_delay / 2).ok())
}

/// What it takes to bring the RTC in line with the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RtcCorrection {
    /// Master time at the moment the Sync was received
    pub master: Timestamp,
    /// Local time at the moment the Sync was received
    pub slave: Timestamp,
    pub seconds_delta: i64,
    pub nanos_delta: u32,
    /// Whether `nanos_delta` has to be taken off the clock
    pub subtract: bool,
}

impl RtcCorrection {
    /// The full offset of the master relative to the slave
    pub fn offset_nanos(&self) -> i64 {
        let nanos = self.nanos_delta as i64;
        let nanos = if self.subtract { -nanos } else { nanos };
        self.seconds_delta * NANOS_PER_SECOND as i64 + nanos
    }
}

/// Compares the master time of a Sync, corrected for the path it took, with
/// the local receive time of that Sync.
pub fn rtc_offset(
    origin: Timestamp,
    correction: u32,
    link_delay: u32,
    slave_rx: Timestamp,
) -> RtcCorrection {
    let corrected = origin.nanos as u64 + correction as u64 + link_delay as u64;
    let master = Timestamp {
        seconds: origin
            .seconds
            .wrapping_add((corrected / NANOS_PER_SECOND as u64) as u32),
        nanos: (corrected % NANOS_PER_SECOND as u64) as u32,
    };

    let (nanos_delta, subtract) = if master.nanos > slave_rx.nanos {
        (master.nanos - slave_rx.nanos, false)
    } else {
        (slave_rx.nanos - master.nanos, true)
    };

    RtcCorrection {
        master,
        slave: slave_rx,
        seconds_delta: master.seconds as i64 - slave_rx.seconds as i64,
        nanos_delta,
        subtract,
    }
}
