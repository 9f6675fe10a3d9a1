//! A [`Stream`]-based interval timer for the lean consensus clock.
//!
//! Each slot is divided into four one-second intervals: propose, vote,
//! safe-target and accept. The stream produces one [`Tick`] per interval; the
//! node shell turns ticks into `advance_time` calls on the fork choice and
//! into production duties.
//!
//! This is implemented with [`tokio::time::Interval`]. An interval may
//! produce items late, but the delays do not accumulate by default.

use core::time::Duration;
use std::time::{Instant, SystemTime};

use anyhow::Result;
use enum_iterator::Sequence;
use futures::stream::{Stream, StreamExt as _};
use thiserror::Error;
use tokio_stream::wrappers::IntervalStream;
use types::{
    consts::{GENESIS_SLOT, INTERVALS_PER_SLOT, SECONDS_PER_INTERVAL, SECONDS_PER_SLOT},
    primitives::{Slot, UnixSeconds},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Tick {
    pub slot: Slot,
    pub kind: TickKind,
}

/// The phase of a slot. Declaration order is wire order: `kind as u64` is the
/// interval index within the slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Sequence)]
pub enum TickKind {
    /// The proposer for the slot publishes its block.
    Propose,
    /// Validators attest.
    Vote,
    /// The safe target is recomputed from pending votes.
    SafeTarget,
    /// Pending votes are promoted and the head recomputed.
    Accept,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ClockError {
    #[error("ran out of slots")]
    RanOutOfSlots,
}

impl Tick {
    #[must_use]
    pub const fn start_of_slot(slot: Slot) -> Self {
        Self {
            slot,
            kind: TickKind::Propose,
        }
    }

    /// The tick in effect at `time`. Times before genesis map to the start of
    /// slot 0.
    #[must_use]
    pub fn at_time(time: UnixSeconds, genesis_time: UnixSeconds) -> Self {
        if time <= genesis_time {
            return Self::start_of_slot(GENESIS_SLOT);
        }

        Self::at_interval((time - genesis_time) / SECONDS_PER_INTERVAL)
    }

    pub fn current(genesis_time: UnixSeconds) -> Result<Self> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs();

        Ok(Self::at_time(now, genesis_time))
    }

    #[must_use]
    pub const fn is_start_of_slot(self) -> bool {
        matches!(self.kind, TickKind::Propose)
    }

    /// The wall-clock second this tick begins at, suitable for
    /// `advance_time` on the fork choice.
    #[must_use]
    pub const fn start_time(self, genesis_time: UnixSeconds) -> UnixSeconds {
        genesis_time + self.slot * SECONDS_PER_SLOT + self.kind as u64 * SECONDS_PER_INTERVAL
    }

    fn at_interval(intervals_since_genesis: u64) -> Self {
        let slot = GENESIS_SLOT + intervals_since_genesis / INTERVALS_PER_SLOT;
        let interval = intervals_since_genesis % INTERVALS_PER_SLOT;

        let kind = enum_iterator::all::<TickKind>()
            .nth(interval as usize)
            .expect("more intervals would add up to additional slots");

        Self { slot, kind }
    }

    fn next(self) -> Result<Self, ClockError> {
        let Self { slot, kind } = self;

        let next_slot = match kind.next() {
            Some(_) => slot,
            None => slot.checked_add(1).ok_or(ClockError::RanOutOfSlots)?,
        };

        let next_kind = enum_iterator::next_cycle(&kind);

        Ok(Self {
            slot: next_slot,
            kind: next_kind,
        })
    }
}

#[must_use]
pub const fn slot_to_time(slot: Slot, genesis_time: UnixSeconds) -> UnixSeconds {
    genesis_time + slot * SECONDS_PER_SLOT
}

#[must_use]
pub const fn time_to_slot(time: UnixSeconds, genesis_time: UnixSeconds) -> Slot {
    if time < genesis_time {
        return GENESIS_SLOT;
    }

    (time - genesis_time) / SECONDS_PER_SLOT
}

/// A stream of ticks, one per interval, starting at the next interval
/// boundary (or at genesis when genesis is still ahead).
pub fn ticks(genesis_time: UnixSeconds) -> Result<impl Stream<Item = Result<Tick>>> {
    // The `Instant` and `SystemTime` obtained here are assumed to correspond
    // to the same point in time. The error is negligible compared to clock
    // differences between nodes.
    let now_instant = Instant::now();

    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)?
        .as_secs();

    let (mut next_tick, delay) = next_tick_with_delay(now, genesis_time);

    let start = now_instant + Duration::from_secs(delay);
    let interval = tokio::time::interval_at(start.into(), Duration::from_secs(SECONDS_PER_INTERVAL));

    Ok(IntervalStream::new(interval).map(move |_| {
        let current_tick = next_tick;
        next_tick = current_tick.next()?;
        Ok(current_tick)
    }))
}

/// The tick at the next interval boundary at or after `now`, with the delay
/// in seconds until it.
fn next_tick_with_delay(now: UnixSeconds, genesis_time: UnixSeconds) -> (Tick, u64) {
    if now <= genesis_time {
        return (Tick::start_of_slot(GENESIS_SLOT), genesis_time - now);
    }

    let intervals_since_genesis = (now - genesis_time).div_ceil(SECONDS_PER_INTERVAL);
    let tick = Tick::at_interval(intervals_since_genesis);
    let boundary = genesis_time + intervals_since_genesis * SECONDS_PER_INTERVAL;

    (tick, boundary - now)
}

#[cfg(test)]
mod tests {
    use enum_iterator::Sequence as _;
    use futures::future::FutureExt as _;
    use test_case::test_case;

    use super::*;

    const GENESIS_TIME: UnixSeconds = 1_000_000_000;

    const fn tick(slot: Slot, kind: TickKind) -> Tick {
        Tick { slot, kind }
    }

    #[test]
    fn tick_kind_count_matches_the_interval_count() {
        assert_eq!(TickKind::CARDINALITY as u64, INTERVALS_PER_SLOT);
    }

    #[test_case(GENESIS_TIME - 24 => tick(0, TickKind::Propose); "24 seconds before genesis")]
    #[test_case(GENESIS_TIME - 1 => tick(0, TickKind::Propose); "1 second before genesis")]
    #[test_case(GENESIS_TIME => tick(0, TickKind::Propose); "at genesis")]
    #[test_case(GENESIS_TIME + 1 => tick(0, TickKind::Vote); "1 second after genesis")]
    #[test_case(GENESIS_TIME + 2 => tick(0, TickKind::SafeTarget); "2 seconds after genesis")]
    #[test_case(GENESIS_TIME + 3 => tick(0, TickKind::Accept); "3 seconds after genesis")]
    #[test_case(GENESIS_TIME + 4 => tick(1, TickKind::Propose); "4 seconds after genesis")]
    #[test_case(GENESIS_TIME + 5 => tick(1, TickKind::Vote); "5 seconds after genesis")]
    #[test_case(GENESIS_TIME + 8 => tick(2, TickKind::Propose); "8 seconds after genesis")]
    fn tick_at_time(time: UnixSeconds) -> Tick {
        Tick::at_time(time, GENESIS_TIME)
    }

    #[test_case(0 => GENESIS_TIME)]
    #[test_case(1 => GENESIS_TIME + 4)]
    #[test_case(10 => GENESIS_TIME + 40)]
    fn slot_start_times(slot: Slot) -> UnixSeconds {
        slot_to_time(slot, GENESIS_TIME)
    }

    #[test_case(GENESIS_TIME - 100 => 0; "before genesis")]
    #[test_case(GENESIS_TIME => 0; "at genesis")]
    #[test_case(GENESIS_TIME + 3 => 0; "late in slot 0")]
    #[test_case(GENESIS_TIME + 4 => 1; "at slot 1")]
    #[test_case(GENESIS_TIME + 41 => 10; "in slot 10")]
    fn slots_at_times(time: UnixSeconds) -> Slot {
        time_to_slot(time, GENESIS_TIME)
    }

    #[test]
    fn tick_start_times_invert_at_time() {
        for interval in 0..16 {
            let tick = Tick::at_interval(interval);
            let start = tick.start_time(GENESIS_TIME);

            assert_eq!(Tick::at_time(start, GENESIS_TIME), tick);
        }
    }

    #[test_case(GENESIS_TIME - 7 => (tick(0, TickKind::Propose), 7); "waits for genesis")]
    #[test_case(GENESIS_TIME => (tick(0, TickKind::Propose), 0); "starts at genesis")]
    #[test_case(GENESIS_TIME + 1 => (tick(0, TickKind::Vote), 0); "on a boundary")]
    #[test_case(GENESIS_TIME + 6 => (tick(1, TickKind::SafeTarget), 0); "mid slot")]
    fn next_ticks_with_delays(now: UnixSeconds) -> (Tick, u64) {
        next_tick_with_delay(now, GENESIS_TIME)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_produces_one_tick_per_second() -> Result<()> {
        let genesis_time = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_secs()
            + 1;

        let mut ticks = ticks(genesis_time)?;
        let mut next_tick = || ticks.next().now_or_never().flatten().transpose();

        assert_eq!(next_tick()?, None);

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(next_tick()?, Some(tick(0, TickKind::Propose)));
        assert_eq!(next_tick()?, None);

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(next_tick()?, Some(tick(0, TickKind::Vote)));

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(next_tick()?, Some(tick(0, TickKind::SafeTarget)));

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(next_tick()?, Some(tick(0, TickKind::Accept)));

        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(next_tick()?, Some(tick(1, TickKind::Propose)));

        Ok(())
    }
}
