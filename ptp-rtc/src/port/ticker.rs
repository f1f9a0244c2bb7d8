/// Counts ticks towards an interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IntervalCounter {
    count: u16,
}

impl IntervalCounter {
    /// Advances the counter by one tick. Returns true (and starts over) when
    /// the counter had already reached `threshold`.
    pub(crate) fn tick(&mut self, threshold: u16) -> bool {
        if self.count >= threshold {
            self.count = 0;
            true
        } else {
            self.count += 1;
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }
}

/// All interval counters of a port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    /// Sync transmission while master, sync receipt timeout while slave
    pub(crate) sync: IntervalCounter,
    /// Announce transmission while master, announce receipt timeout while
    /// slave
    pub(crate) announce: IntervalCounter,
    pub(crate) link_delay: IntervalCounter,
    /// Consecutive peer delay cycles without a complete answer
    pub(crate) lost_responses: u8,
    /// Accepted Sync/FollowUp pairs since the last rate records update
    pub(crate) sync_pairs: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_every_threshold_plus_one_ticks() {
        let mut counter = IntervalCounter::default();
        let fired: Vec<bool> = (0..8).map(|_| counter.tick(2)).collect();
        assert_eq!(
            fired,
            vec![false, false, true, false, false, true, false, false]
        );
    }

    #[test]
    fn zero_threshold_fires_every_tick() {
        let mut counter = IntervalCounter::default();
        assert!(counter.tick(0));
        assert!(counter.tick(0));
    }

    #[test]
    fn reset_starts_over() {
        let mut counter = IntervalCounter::default();
        assert!(!counter.tick(1));
        counter.reset();
        assert!(!counter.tick(1));
        assert!(counter.tick(1));
    }
}
