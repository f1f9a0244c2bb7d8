//! Dataset comparison for the best master clock algorithm

use core::cmp::Ordering;

use super::BmcData;

impl BmcData {
    /// Orders two datasets by how good a master they describe; `Less` means
    /// `self` is the better one.
    ///
    /// Fields are compared lexicographically, lower wins: priority 1, clock
    /// quality (class, accuracy, variance), priority 2, grandmaster identity,
    /// steps removed, then the sender's port identity as a tie breaker.
    pub fn compare(&self, other: &BmcData) -> Ordering {
        self.priority_1
            .cmp(&other.priority_1)
            .then_with(|| self.clock_quality.packed().cmp(&other.clock_quality.packed()))
            .then_with(|| self.priority_2.cmp(&other.priority_2))
            .then_with(|| self.grandmaster_identity.cmp(&other.grandmaster_identity))
            .then_with(|| self.steps_removed.cmp(&other.steps_removed))
            .then_with(|| {
                self.source_port_identity
                    .clock_identity
                    .cmp(&other.source_port_identity.clock_identity)
            })
            .then_with(|| {
                self.source_port_identity
                    .port_number
                    .cmp(&other.source_port_identity.port_number)
            })
    }

    /// Strictly better. Two equal datasets are not better than each other, so
    /// the incumbent stays.
    pub fn is_better_than(&self, other: &BmcData) -> bool {
        self.compare(other) == Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructures::common::{ClockIdentity, ClockQuality, PortIdentity};

    const IDENTITY_A: ClockIdentity = ClockIdentity([1, 1, 1, 1, 1, 1, 1, 1]);
    const IDENTITY_B: ClockIdentity = ClockIdentity([2, 2, 2, 2, 2, 2, 2, 2]);

    fn get_default_test_pair() -> (BmcData, BmcData) {
        Default::default()
    }

    #[test]
    fn field_precedence() {
        // Start with two identical datasets
        let (mut a, mut b) = get_default_test_pair();
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert!(!a.is_better_than(&b));
        assert!(!b.is_better_than(&a));

        // Work bottom up, flipping the winner on every step so a stale result
        // can not come through
        a.source_port_identity.port_number = 1;
        b.source_port_identity.port_number = 2;
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));

        a.source_port_identity.clock_identity = IDENTITY_B;
        b.source_port_identity.clock_identity = IDENTITY_A;
        assert!(b.is_better_than(&a));
        assert!(!a.is_better_than(&b));

        a.steps_removed = 0;
        b.steps_removed = 1;
        assert!(a.is_better_than(&b));

        a.grandmaster_identity = IDENTITY_B;
        b.grandmaster_identity = IDENTITY_A;
        assert!(b.is_better_than(&a));

        a.priority_2 = 10;
        b.priority_2 = 20;
        assert!(a.is_better_than(&b));

        a.clock_quality.offset_scaled_log_variance = 2;
        b.clock_quality.offset_scaled_log_variance = 1;
        assert!(b.is_better_than(&a));

        a.clock_quality.clock_accuracy = 0x20;
        b.clock_quality.clock_accuracy = 0x21;
        assert!(a.is_better_than(&b));

        a.clock_quality.clock_class = 7;
        b.clock_quality.clock_class = 6;
        assert!(b.is_better_than(&a));

        a.priority_1 = 1;
        b.priority_1 = 128;
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
    }

    #[test]
    fn role_and_interval_are_ignored() {
        let (mut a, b) = get_default_test_pair();
        a.i_am_master = true;
        a.announce_interval_duration = 42;
        assert_eq!(a.compare(&b), Ordering::Equal);
    }

    fn sample_datasets() -> Vec<BmcData> {
        let mut datasets = Vec::new();
        for priority_1 in [1, 128] {
            for quality in [0x0621_0001, 0xf8fe_4100] {
                for gm in [IDENTITY_A, IDENTITY_B] {
                    for steps_removed in [0, 1] {
                        for port_number in [1, 2] {
                            datasets.push(BmcData {
                                source_port_identity: PortIdentity {
                                    clock_identity: gm,
                                    port_number,
                                },
                                grandmaster_identity: gm,
                                steps_removed,
                                clock_quality: ClockQuality::from_packed(quality),
                                priority_1,
                                priority_2: 248,
                                ..Default::default()
                            });
                        }
                    }
                }
            }
        }
        datasets
    }

    #[test]
    fn strict_total_order() {
        let datasets = sample_datasets();

        for a in &datasets {
            for b in &datasets {
                // antisymmetric, and only equal datasets tie
                assert_eq!(a.compare(b), b.compare(a).reverse());
                assert_eq!(a.compare(b) == Ordering::Equal, a == b);

                for c in &datasets {
                    if a.is_better_than(b) && b.is_better_than(c) {
                        assert!(a.is_better_than(c));
                    }
                }
            }
        }
    }

    #[test]
    fn lower_priority_1_wins() {
        let local = BmcData {
            priority_1: 128,
            ..Default::default()
        };
        let peer = BmcData {
            priority_1: 1,
            clock_quality: ClockQuality::from_packed(0xffff_ffff),
            ..Default::default()
        };
        assert!(peer.is_better_than(&local));
    }
}
