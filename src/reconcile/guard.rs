use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::FilterId;

/// Generation marker handed to one pass for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    filter: FilterId,
    generation: u64,
}

impl Ticket {
    pub fn filter(&self) -> &FilterId {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Generations {
    counter: u64,
    live: HashMap<FilterId, u64>,
}

impl Generations {
    fn issue(&mut self, filter: &FilterId) -> Ticket {
        self.counter += 1;
        self.live.insert(filter.clone(), self.counter);
        Ticket {
            filter: filter.clone(),
            generation: self.counter,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.live.get(&ticket.filter) == Some(&ticket.generation)
    }
}

/// Tracks the live generation of every filter so results from superseded
/// passes can be recognised and dropped.
///
/// Generations come from one engine-wide counter and never repeat. Every
/// write to the selection store goes through [`commit_if_current`] or
/// [`invalidate_with`], so the generation lock also orders commits.
///
/// [`commit_if_current`]: RequestGuard::commit_if_current
/// [`invalidate_with`]: RequestGuard::invalidate_with
#[derive(Debug, Default)]
pub struct RequestGuard {
    generations: Mutex<Generations>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation for `filter`, superseding any earlier ticket.
    pub fn issue(&self, filter: &FilterId) -> Ticket {
        self.lock().issue(filter)
    }

    /// Issues tickets for several filters in one step, so no other pass can
    /// interleave its own issuance halfway through.
    pub fn issue_all<'a, I>(&self, filters: I) -> Vec<Ticket>
    where
        I: IntoIterator<Item = &'a FilterId>,
    {
        let mut generations = self.lock();
        filters.into_iter().map(|f| generations.issue(f)).collect()
    }

    /// Starts a pass rooted at `root` that will rewrite `descendants`.
    ///
    /// Every older ticket on any of those filters is superseded, so an older
    /// pass changing one of them is dropped in favour of this one. Only the
    /// root's ticket is returned: whether this pass may still commit depends
    /// on nothing else.
    pub fn begin<'a, I>(&self, root: &FilterId, descendants: I) -> Ticket
    where
        I: IntoIterator<Item = &'a FilterId>,
    {
        let mut generations = self.lock();
        for descendant in descendants {
            generations.issue(descendant);
        }
        generations.issue(root)
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.lock().is_current(ticket)
    }

    /// Runs `commit` while holding the generation lock, provided every
    /// ticket is still live. No pass can begin or commit between the check
    /// and the write. Returns `None` without calling `commit` otherwise.
    pub fn commit_if_current<T, F>(&self, tickets: &[Ticket], commit: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let generations = self.lock();
        if tickets.iter().all(|t| generations.is_current(t)) {
            Some(commit())
        } else {
            None
        }
    }

    /// Supersedes every outstanding ticket of `filters` and runs `commit` in
    /// the same locked step.
    pub fn invalidate_with<'a, I, T, F>(&self, filters: I, commit: F) -> T
    where
        I: IntoIterator<Item = &'a FilterId>,
        F: FnOnce() -> T,
    {
        let mut generations = self.lock();
        for filter in filters {
            generations.issue(filter);
        }
        commit()
    }

    /// Supersedes every outstanding ticket for the given filters.
    pub fn invalidate_all<'a, I>(&self, filters: I)
    where
        I: IntoIterator<Item = &'a FilterId>,
    {
        self.invalidate_with(filters, || ());
    }

    fn lock(&self) -> MutexGuard<'_, Generations> {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
