use std::fmt;

use crate::foundation::error::{SortError, SortResult};

/// A named classification bucket.
///
/// Names are trimmed on construction; two labels are equal when their trimmed names are.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    name: String,
}

impl Label {
    pub fn new(name: impl AsRef<str>) -> SortResult<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(SortError::validation("label name must be non-blank"));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
