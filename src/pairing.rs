use crate::decode::{CprParity, RawMessage};

/// The latest even and odd position messages of one aircraft.
///
/// A new message of a parity replaces the previous one. Once both slots are
/// occupied a resolution is attempted and both slots are emptied, whatever
/// the result.
#[derive(Debug, Clone, Default)]
pub struct CprPairSlots {
    slots: [Option<(RawMessage, f64)>; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    /// Only one parity is held.
    Waiting,
    /// Both halves were held but too far apart in time. Holds the gap in seconds.
    Stale(f64),
    /// The resolver refused the pair.
    Unresolved,
    Resolved { lat: f64, lon: f64 },
}

impl CprPairSlots {
    /// Store `msg` in the `parity` slot and try to pair.
    ///
    /// `resolve` gets the even message and time followed by the odd ones and
    /// is only called when the halves are less than `window` seconds apart.
    pub fn offer<F>(
        &mut self,
        parity: CprParity,
        msg: RawMessage,
        t: f64,
        window: f64,
        resolve: F,
    ) -> PairOutcome
    where
        F: FnOnce(&RawMessage, f64, &RawMessage, f64) -> Option<(f64, f64)>,
    {
        self.slots[parity.index()] = Some((msg, t));

        let (Some((even, t_even)), Some((odd, t_odd))) = (&self.slots[0], &self.slots[1]) else {
            return PairOutcome::Waiting;
        };

        let gap = (t_even - t_odd).abs();
        let outcome = if gap < window {
            match resolve(even, *t_even, odd, *t_odd) {
                Some((lat, lon)) => PairOutcome::Resolved { lat, lon },
                None => PairOutcome::Unresolved,
            }
        } else {
            PairOutcome::Stale(gap)
        };

        self.slots = [None, None];
        outcome
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
