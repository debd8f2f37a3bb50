//! Chore-to-sailor matching
//!
//! The matcher works on a snapshot: pending chores in FIFO order, crew
//! in ascending name order. The selection policy sits behind
//! [`MatchStrategy`] so it can be swapped without touching the control
//! loop's invariants.

use flotilla_core::domain::chore::{Chore, ChoreRequest};
use flotilla_core::domain::sailor::Sailor;

/// Picks a sailor for one request out of the working crew snapshot.
pub trait MatchStrategy: Send + Sync {
    /// Returns the index of the selected sailor, or `None` when nothing
    /// fits right now. `crew` is sorted by ascending name.
    fn select(
        &self,
        crew: &[Sailor],
        request: &ChoreRequest,
        now: i64,
        deadline_secs: i64,
    ) -> Option<usize>;
}

/// First sailor (by ascending name) that fits the request. Deterministic
/// given the snapshot.
pub struct FirstFit;

impl MatchStrategy for FirstFit {
    fn select(
        &self,
        crew: &[Sailor],
        request: &ChoreRequest,
        now: i64,
        deadline_secs: i64,
    ) -> Option<usize> {
        crew.iter()
            .position(|sailor| sailor.fits(request, now, deadline_secs))
    }
}

/// One planned assignment out of a match pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub chore_id: u64,
    pub sailor: String,
}

/// Plans the assignments for one tick.
///
/// Walks `pending` in ascending chore id order and books each selected
/// chore against the working snapshot, so one sailor is never
/// over-committed within a tick. `crew` must be sorted by name.
pub fn plan_assignments(
    crew: &mut [Sailor],
    pending: &[Chore],
    strategy: &dyn MatchStrategy,
    now: i64,
    deadline_secs: i64,
) -> Vec<Assignment> {
    let mut plans = Vec::new();

    for chore in pending {
        let request = &chore.configuration;
        if let Some(i) = strategy.select(crew, request, now, deadline_secs) {
            crew[i].used_cpus += request.cpus;
            crew[i].used_gpus += request.gpus;
            plans.push(Assignment {
                chore_id: chore.chore_id,
                sailor: crew[i].name.clone(),
            });
        }
    }

    plans
}
