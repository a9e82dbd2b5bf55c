use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Where an item's image bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A file on disk.
    Path(PathBuf),
    /// Encoded image bytes already held in memory, tagged with a name for diagnostics.
    Memory { name: String, bytes: Arc<[u8]> },
}

impl Location {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn memory(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Memory { .. } => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Memory { name, .. } => write!(f, "memory:{name}"),
        }
    }
}
