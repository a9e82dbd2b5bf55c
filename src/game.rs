use std::{fmt, sync::Arc};

use crate::{
    assets::decode::{Decode, FsDecoder},
    foundation::error::{SortError, SortResult},
    model::{item::LabeledItem, label::Label},
    sequence::SequenceList,
};

/// Fewest distinct labels a playable game may have.
pub const MIN_LABELS: usize = 2;
/// Most distinct labels a playable game may have.
pub const MAX_LABELS: usize = 4;
/// Item count required when [`GameOpts::require_minimum_size`] is set.
pub const MINIMUM_SIZE: usize = 60;

/// Scoring and validation knobs for [`Game::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOpts {
    /// Added to the score for a correct placement.
    pub correct_delta: i64,
    /// Added to the score for an incorrect placement (normally negative).
    pub incorrect_delta: i64,
    /// Reject lists with fewer than [`MINIMUM_SIZE`] items.
    pub require_minimum_size: bool,
    /// Round length handed to the presentation layer's timer.
    pub time_limit_secs: u32,
}

impl Default for GameOpts {
    fn default() -> Self {
        Self {
            correct_delta: 1,
            incorrect_delta: -1,
            require_minimum_size: true,
            time_limit_secs: 60,
        }
    }
}

/// One playable classification round.
///
/// Owns the item sequence and the running score. Like [`SequenceList`], a `Game` does no
/// internal locking; wrap it in a `Mutex` to share it with a
/// [`PrefetchBuffer`](crate::PrefetchBuffer).
pub struct Game {
    instructions: String,
    list: SequenceList,
    labels: Vec<Label>,
    score: i64,
    opts: GameOpts,
    decoder: Arc<dyn Decode>,
}

impl Game {
    pub fn new(
        instructions: impl Into<String>,
        list: SequenceList,
        opts: GameOpts,
    ) -> SortResult<Self> {
        let instructions = instructions.into();
        if instructions.trim().is_empty() {
            return Err(SortError::validation("instructions must be non-blank"));
        }
        if opts.require_minimum_size && list.size() < MINIMUM_SIZE {
            return Err(SortError::validation(format!(
                "sequence list only contains {} items, at least {MINIMUM_SIZE} are required",
                list.size()
            )));
        }

        let labels = distinct_labels(&list);
        if labels.len() < MIN_LABELS {
            return Err(SortError::validation(format!(
                "items use {} distinct labels, at least {MIN_LABELS} are required",
                labels.len()
            )));
        }
        if labels.len() > MAX_LABELS {
            return Err(SortError::validation(format!(
                "items use {} distinct labels, at most {MAX_LABELS} are allowed",
                labels.len()
            )));
        }

        Ok(Self {
            instructions,
            list,
            labels,
            score: 0,
            opts,
            decoder: Arc::new(FsDecoder),
        })
    }

    /// Replace the decoder used by [`Game::next_image`].
    pub fn with_decoder(mut self, decoder: Arc<dyn Decode>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Distinct labels in the order they were first seen.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn opts(&self) -> &GameOpts {
        &self.opts
    }

    pub fn correct_delta(&self) -> i64 {
        self.opts.correct_delta
    }

    pub fn incorrect_delta(&self) -> i64 {
        self.opts.incorrect_delta
    }

    pub fn requires_minimum_size(&self) -> bool {
        self.opts.require_minimum_size
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.opts.time_limit_secs
    }

    pub fn decoder(&self) -> &Arc<dyn Decode> {
        &self.decoder
    }

    /// Score a placement of `item` under `candidate` and return the new score.
    /// The score saturates at the `i64` range.
    pub fn score_image(&mut self, item: &LabeledItem, candidate: &Label) -> i64 {
        let delta = if item.score_against(candidate) {
            self.opts.correct_delta
        } else {
            self.opts.incorrect_delta
        };
        self.score = self.score.saturating_add(delta);
        self.score
    }

    /// Take the next item from the sequence with its raster already decoded.
    pub fn next_image(&mut self) -> SortResult<Arc<LabeledItem>> {
        let item = self.next_item()?;
        item.load(self.decoder.as_ref())?;
        Ok(item)
    }

    /// Advance the sequence without decoding. Callers load the item themselves,
    /// typically with [`Game::decoder`] after releasing any lock on the game.
    pub fn next_item(&mut self) -> SortResult<Arc<LabeledItem>> {
        self.list.next()
    }

    pub fn has_next(&self) -> bool {
        self.list.remaining() > 0 || self.list.does_cycle()
    }

    /// Score `item`, then advance. The score is kept even if advancing fails.
    pub fn next_step(
        &mut self,
        item: &LabeledItem,
        candidate: &Label,
    ) -> SortResult<Arc<LabeledItem>> {
        self.score_image(item, candidate);
        self.next_image()
    }

    pub fn set_cycle(&mut self, cycle: bool) {
        self.list.set_cycle(cycle);
    }

    pub fn set_reshuffle_on_cycle(&mut self, reshuffle: bool) {
        self.list.set_reshuffle_on_cycle(reshuffle);
    }

    pub fn does_cycle(&self) -> bool {
        self.list.does_cycle()
    }

    pub fn does_randomize(&self) -> bool {
        self.list.does_reshuffle()
    }

    /// Total number of items in the game.
    pub fn available(&self) -> usize {
        self.list.size()
    }

    pub fn remaining(&self) -> usize {
        self.list.remaining()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("instructions", &self.instructions)
            .field("list", &self.list)
            .field("labels", &self.labels)
            .field("score", &self.score)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

fn distinct_labels(list: &SequenceList) -> Vec<Label> {
    let mut labels = Vec::<Label>::new();
    for item in list.items() {
        if !labels.contains(item.label()) {
            labels.push(item.label().clone());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::foundation::core::Location;

    fn list_with_labels(counts: &[(&str, usize)]) -> SequenceList {
        let mut items = Vec::new();
        for (name, n) in counts {
            let label = Label::new(name).unwrap();
            for i in 0..*n {
                items.push(Arc::new(
                    LabeledItem::new(
                        Location::path(format!("{name}/{i}.png")),
                        label.clone(),
                        format!("{i}.png"),
                    )
                    .unwrap(),
                ));
            }
        }
        SequenceList::with_rng(&items, StdRng::seed_from_u64(11)).unwrap()
    }

    fn relaxed() -> GameOpts {
        GameOpts {
            require_minimum_size: false,
            ..GameOpts::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let opts = GameOpts::default();
        assert_eq!(opts.correct_delta, 1);
        assert_eq!(opts.incorrect_delta, -1);
        assert!(opts.require_minimum_size);
        assert_eq!(opts.time_limit_secs, 60);
    }

    #[test]
    fn blank_instructions_are_rejected() {
        let list = list_with_labels(&[("a", 1), ("b", 1)]);
        assert!(matches!(
            Game::new(" \n", list, relaxed()),
            Err(SortError::Validation(_))
        ));
    }

    #[test]
    fn minimum_size_is_enforced_only_when_required() {
        let small = list_with_labels(&[("a", 30), ("b", 29)]);
        assert!(Game::new("sort", small, GameOpts::default()).is_err());

        let exact = list_with_labels(&[("a", 30), ("b", 30)]);
        assert!(Game::new("sort", exact, GameOpts::default()).is_ok());

        let small = list_with_labels(&[("a", 1), ("b", 1)]);
        assert!(Game::new("sort", small, relaxed()).is_ok());
    }

    #[test]
    fn labels_are_derived_from_served_items_too() {
        let mut list = list_with_labels(&[("a", 1), ("b", 1)]);
        list.next().unwrap();
        list.next().unwrap();
        let game = Game::new("sort", list, relaxed()).unwrap();
        assert_eq!(game.labels().len(), 2);
    }

    #[test]
    fn debug_omits_decoder() {
        let game = Game::new("sort", list_with_labels(&[("a", 1), ("b", 1)]), relaxed()).unwrap();
        let dbg = format!("{game:?}");
        assert!(dbg.contains("instructions"));
        assert!(dbg.contains(".."));
    }
}
