#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Restart strategies for the CDCL engine.
//!
//! A restart abandons the current search path and backtracks to level 0, keeping the
//! learnt clauses. Restarts are also the point where the engine reduces its clause
//! database.
//!
//! - `Luby`: intervals follow the Luby sequence `1, 1, 2, 1, 1, 2, 4, ...` scaled by `N`.
//! - `Never`: never restarts.

use std::fmt::Debug;

/// Decides when the engine should restart.
///
/// `should_restart` is called once per conflict.
pub trait Restarter: Debug + Clone {
    /// Creates the strategy in its starting state.
    fn new() -> Self;

    /// Conflicts remaining until the next restart.
    fn restarts_in(&self) -> usize;

    /// Counts one conflict towards the next restart.
    fn increment_restarts_in(&mut self);

    /// Starts the next interval.
    fn restart(&mut self);

    /// Restarts performed so far.
    fn num_restarts(&self) -> usize;

    /// Counts a conflict and reports whether the interval is exhausted.
    ///
    /// # Returns
    /// `true` if a restart was triggered, `false` otherwise.
    fn should_restart(&mut self) -> bool {
        if self.restarts_in() == 0 {
            self.restart();
            true
        } else {
            self.increment_restarts_in();
            false
        }
    }
}

/// Luby restarts with unit interval `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Luby<const N: usize> {
    restarts: usize,
    restarts_in: usize,
}

impl<const N: usize> Luby<N> {
    /// The `x`-th element (0-based) of the Luby sequence.
    #[must_use]
    pub fn luby(mut x: usize) -> usize {
        let mut size = 1_usize;
        let mut seq = 0_u32;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }
        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x %= size;
        }
        1 << seq
    }
}

impl<const N: usize> Restarter for Luby<N> {
    fn new() -> Self {
        Self {
            restarts: 0,
            restarts_in: Self::luby(0) * N,
        }
    }

    fn restarts_in(&self) -> usize {
        self.restarts_in
    }

    fn increment_restarts_in(&mut self) {
        self.restarts_in = self.restarts_in.saturating_sub(1);
    }

    fn restart(&mut self) {
        self.restarts = self.restarts.wrapping_add(1);
        self.restarts_in = Self::luby(self.restarts) * N;
    }

    fn num_restarts(&self) -> usize {
        self.restarts
    }
}

/// Never restarts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Never;

impl Restarter for Never {
    fn new() -> Self {
        Self
    }

    fn restarts_in(&self) -> usize {
        usize::MAX
    }

    fn increment_restarts_in(&mut self) {}

    fn restart(&mut self) {}

    fn num_restarts(&self) -> usize {
        0
    }

    fn should_restart(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luby_sequence() {
        let seq: Vec<usize> = (0..15).map(Luby::<1>::luby).collect();
        assert_eq!(seq, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
    }

    #[test]
    fn test_luby_intervals() {
        let mut restarter = Luby::<2>::new();
        let mut fired = Vec::new();
        for conflict in 0..20 {
            if restarter.should_restart() {
                fired.push(conflict);
            }
        }
        // Intervals 2, 2, 4, 2, 2, 4 conflicts, each followed by the restarting one.
        assert_eq!(fired, vec![2, 5, 10, 13, 16]);
        assert_eq!(restarter.num_restarts(), 5);
    }

    #[test]
    fn test_never() {
        let mut restarter = Never::new();
        assert!((0..1000).all(|_| !restarter.should_restart()));
        assert_eq!(restarter.num_restarts(), 0);
    }
}
