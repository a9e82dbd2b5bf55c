//! Engine for a timed image classification game.
//!
//! - Build [`LabeledItem`]s (or load a whole folder with [`read_game_folder`])
//! - Shuffle them into a [`SequenceList`] and wrap it in a [`Game`]
//! - Pull items with [`Game::next_image`], or keep a few fitted and ready with a
//!   [`PrefetchBuffer`]
//! - Score placements with [`Game::score_image`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod game;
pub mod library;
pub mod model;
pub mod prefetch;
pub mod sequence;

pub use assets::decode::{Decode, DecodeError, FsDecoder, Raster, decode_image};
pub use assets::fit::{DEFAULT_FILL_RATIO, Fitted, MAX_FITTED_PIXELS, fit_to_bounds};
pub use config::{GameProperties, PROPERTIES_FILE_NAME};
pub use foundation::core::{Location, Point, Rect, Size, Vec2};
pub use foundation::error::{SortError, SortResult};
pub use game::{Game, GameOpts, MAX_LABELS, MIN_LABELS, MINIMUM_SIZE};
pub use library::{
    LoadedGame, LoadedLibrary, files_in, read_game_folder, read_game_folder_with_opts,
    read_game_folder_with_rng, read_games, read_items, sub_directories,
};
pub use model::{item::LabeledItem, label::Label};
pub use prefetch::{PrefetchBuffer, PrefetchStats, ReadyItem};
pub use sequence::SequenceList;
