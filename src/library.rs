use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    config::{GameProperties, PROPERTIES_FILE_NAME},
    foundation::{
        core::Location,
        error::{SortError, SortResult},
    },
    game::{Game, GameOpts},
    model::{item::LabeledItem, label::Label},
    sequence::SequenceList,
};

/// A game built from one folder of a library.
#[derive(Debug)]
pub struct LoadedGame {
    pub folder: PathBuf,
    pub properties: GameProperties,
    pub game: Game,
}

/// Result of loading every game folder under a library root.
#[derive(Debug, Default)]
pub struct LoadedLibrary {
    pub games: Vec<LoadedGame>,
    /// Folders that could not be loaded, with the reason.
    pub failures: Vec<(PathBuf, SortError)>,
}

/// Sub-directories of `dir`, sorted by path.
pub fn sub_directories(dir: &Path) -> SortResult<Vec<PathBuf>> {
    list_entries(dir, |ty| ty.is_dir())
}

/// Regular, non-hidden files in `dir`, sorted by path.
pub fn files_in(dir: &Path) -> SortResult<Vec<PathBuf>> {
    let files = list_entries(dir, |ty| ty.is_file())?;
    Ok(files
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect())
}

fn list_entries(
    dir: &Path,
    keep: impl Fn(&std::fs::FileType) -> bool,
) -> SortResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        let ty = entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?;
        if keep(&ty) {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Build one item per file in each sub-directory of `game_folder`, labeled by the
/// sub-directory's name.
pub fn read_items(game_folder: &Path) -> SortResult<Vec<Arc<LabeledItem>>> {
    let mut items = Vec::new();
    for label_dir in sub_directories(game_folder)? {
        let name = label_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = Label::new(&name)?;
        for file in files_in(&label_dir)? {
            let display_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            items.push(Arc::new(LabeledItem::new(
                Location::Path(file),
                label.clone(),
                display_name,
            )?));
        }
    }

    if items.is_empty() {
        return Err(SortError::validation(format!(
            "game folder '{}' has no images inside its label folders",
            game_folder.display()
        )));
    }
    Ok(items)
}

/// Load the game in `folder` with an entropy-seeded shuffle.
pub fn read_game_folder(folder: &Path) -> SortResult<LoadedGame> {
    read_game_folder_with_rng(folder, StdRng::from_entropy())
}

/// Load the game in `folder`, shuffling with `rng`.
pub fn read_game_folder_with_rng(
    folder: &Path,
    rng: impl RngCore + Send + 'static,
) -> SortResult<LoadedGame> {
    read_game_folder_with_opts(folder, rng, |_| {})
}

/// Load the game in `folder`, letting `adjust` override the options from `properties.omg`
/// before the game is validated.
#[tracing::instrument(skip_all, fields(folder = %folder.display()))]
pub fn read_game_folder_with_opts(
    folder: &Path,
    rng: impl RngCore + Send + 'static,
    adjust: impl FnOnce(&mut GameOpts),
) -> SortResult<LoadedGame> {
    let properties = GameProperties::read(&folder.join(PROPERTIES_FILE_NAME))?;
    let items = read_items(folder)?;

    let mut list = SequenceList::with_rng(&items, rng)?;
    list.set_cycle(properties.cycle);
    list.set_reshuffle_on_cycle(properties.randomize);

    let mut opts = properties.game_opts();
    adjust(&mut opts);
    let game = Game::new(properties.instructions.clone(), list, opts)?;
    tracing::debug!(
        items = game.available(),
        labels = game.labels().len(),
        "game folder loaded"
    );
    Ok(LoadedGame {
        folder: folder.to_path_buf(),
        properties,
        game,
    })
}

/// Load every sub-directory of `root` as a game folder.
///
/// A folder that fails to load is logged and recorded in [`LoadedLibrary::failures`]; the rest
/// still load. Only an unreadable `root` is an error.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn read_games(root: &Path) -> SortResult<LoadedLibrary> {
    let mut library = LoadedLibrary::default();
    for folder in sub_directories(root)? {
        match read_game_folder(&folder) {
            Ok(game) => library.games.push(game),
            Err(err) => {
                tracing::warn!(
                    folder = %folder.display(),
                    error = %err,
                    "game folder could not be loaded"
                );
                library.failures.push((folder, err));
            }
        }
    }
    Ok(library)
}
