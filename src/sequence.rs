use std::{collections::VecDeque, fmt, sync::Arc};

use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};

use crate::{
    foundation::error::{SortError, SortResult},
    model::item::LabeledItem,
};

/// Randomized, non-repeating traversal over a fixed set of items.
///
/// Items move from `pending` to `served` as they are handed out. When `pending` runs dry the
/// list either stops with [`SortError::Exhausted`] or, with cycling enabled, starts a new pass
/// over the served items: freshly shuffled when `reshuffle_on_cycle` is set, otherwise in the
/// exact order they were served during the previous pass.
///
/// Not synchronised. Share it behind a lock if more than one thread needs it.
pub struct SequenceList {
    pending: VecDeque<Arc<LabeledItem>>,
    served: VecDeque<Arc<LabeledItem>>,
    cycle: bool,
    reshuffle_on_cycle: bool,
    rng: Box<dyn RngCore + Send>,
}

impl SequenceList {
    /// Shuffle `items` with an entropy-seeded generator.
    pub fn new(items: &[Arc<LabeledItem>]) -> SortResult<Self> {
        Self::with_rng(items, StdRng::from_entropy())
    }

    /// Shuffle `items` with the supplied random source.
    ///
    /// The same seed always produces the same traversal order.
    pub fn with_rng(
        items: &[Arc<LabeledItem>],
        rng: impl RngCore + Send + 'static,
    ) -> SortResult<Self> {
        if items.is_empty() {
            return Err(SortError::validation(
                "sequence list requires at least one item",
            ));
        }

        let mut rng: Box<dyn RngCore + Send> = Box::new(rng);
        let pending = permute(items.to_vec(), rng.as_mut());
        let served = VecDeque::with_capacity(pending.len());
        Ok(Self {
            pending,
            served,
            cycle: false,
            reshuffle_on_cycle: false,
            rng,
        })
    }

    /// Hand out the next item.
    pub fn next(&mut self) -> SortResult<Arc<LabeledItem>> {
        if self.pending.is_empty() {
            if !self.cycle {
                return Err(SortError::Exhausted);
            }
            let previous = std::mem::take(&mut self.served);
            self.pending = if self.reshuffle_on_cycle {
                permute(Vec::from(previous), self.rng.as_mut())
            } else {
                previous
            };
            tracing::debug!(
                items = self.pending.len(),
                reshuffled = self.reshuffle_on_cycle,
                "sequence list starting a new cycle"
            );
        }

        let front = self.pending.pop_front().ok_or(SortError::Exhausted)?;
        self.served.push_back(Arc::clone(&front));
        Ok(front)
    }

    /// Total number of items, pending and served.
    pub fn size(&self) -> usize {
        self.pending.len() + self.served.len()
    }

    /// Items not yet handed out during the current cycle.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Items already handed out during the current cycle.
    pub fn served(&self) -> usize {
        self.served.len()
    }

    pub fn set_cycle(&mut self, cycle: bool) {
        self.cycle = cycle;
    }

    pub fn set_reshuffle_on_cycle(&mut self, reshuffle: bool) {
        self.reshuffle_on_cycle = reshuffle;
    }

    pub fn does_cycle(&self) -> bool {
        self.cycle
    }

    pub fn does_reshuffle(&self) -> bool {
        self.reshuffle_on_cycle
    }

    /// Every item in the backing set: pending items in order, then served items in order.
    pub fn items(&self) -> impl Iterator<Item = &Arc<LabeledItem>> {
        self.pending.iter().chain(self.served.iter())
    }

    /// Pending items in the order they will be handed out.
    pub fn pending_items(&self) -> impl Iterator<Item = &Arc<LabeledItem>> {
        self.pending.iter()
    }
}

impl fmt::Debug for SequenceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceList")
            .field("size", &self.size())
            .field("remaining", &self.remaining())
            .field("cycle", &self.cycle)
            .field("reshuffle_on_cycle", &self.reshuffle_on_cycle)
            .finish_non_exhaustive()
    }
}

/// Move every element of `source` into a new queue in uniformly random order by repeatedly
/// removing a randomly chosen remaining element.
fn permute(
    mut source: Vec<Arc<LabeledItem>>,
    rng: &mut (dyn RngCore + Send),
) -> VecDeque<Arc<LabeledItem>> {
    let mut out = VecDeque::with_capacity(source.len());
    while !source.is_empty() {
        let idx = rng.gen_range(0..source.len());
        out.push_back(source.remove(idx));
    }
    out
}
