use std::path::Path;

use crate::{
    foundation::error::{SortError, SortResult},
    game::GameOpts,
};

/// Name of the per-game properties file inside a game folder.
pub const PROPERTIES_FILE_NAME: &str = "properties.omg";

/// Settings read from a game folder's `properties.omg`.
///
/// The file is line-oriented `key=value`, split on the first `=`:
///
/// ```text
/// instructions=Sort the animals
/// increment=2
/// decrement=-1
/// cycle=true
/// time=90
/// ```
///
/// `instructions`, `increment` and `decrement` are required. `cycle`, `randomize` (default
/// `false`), `require60` (default `true`) and `time` (seconds, default 60) are optional.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GameProperties {
    pub instructions: String,
    pub increment: i64,
    pub decrement: i64,
    pub cycle: bool,
    pub randomize: bool,
    pub require60: bool,
    pub time_secs: u32,
}

impl GameProperties {
    pub fn read(path: &Path) -> SortResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SortError::config(path, 0, format!("cannot read properties file: {e}"))
        })?;
        Self::parse(&text, path)
    }

    /// Parse properties text. `path` is only used to label errors.
    pub fn parse(text: &str, path: &Path) -> SortResult<Self> {
        let mut instructions = None;
        let mut increment = None;
        let mut decrement = None;
        let mut cycle = None;
        let mut randomize = None;
        let mut require60 = None;
        let mut time_secs = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let err = |msg: String| SortError::config(path, line_no, msg);

            let Some((key, value)) = line.split_once('=') else {
                return Err(err(format!("'{line}' does not follow the format key=value")));
            };
            let key = key.trim();
            let value = value.trim();

            let seen = match key {
                "instructions" => instructions.replace(value.to_string()).is_some(),
                "increment" => increment.replace(parse_int(value).map_err(err)?).is_some(),
                "decrement" => decrement.replace(parse_int(value).map_err(err)?).is_some(),
                "cycle" => cycle.replace(parse_bool(value).map_err(err)?).is_some(),
                "randomize" => randomize.replace(parse_bool(value).map_err(err)?).is_some(),
                "require60" => require60.replace(parse_bool(value).map_err(err)?).is_some(),
                "time" => time_secs.replace(parse_secs(value).map_err(err)?).is_some(),
                other => return Err(err(format!("unrecognized property '{other}'"))),
            };
            if seen {
                return Err(err(format!("property '{key}' is set more than once")));
            }
        }

        let missing =
            |key: &str| SortError::config(path, 0, format!("missing required property '{key}'"));
        let instructions = instructions.ok_or_else(|| missing("instructions"))?;
        if instructions.is_empty() {
            return Err(SortError::config(path, 0, "instructions must be non-blank"));
        }

        Ok(Self {
            instructions,
            increment: increment.ok_or_else(|| missing("increment"))?,
            decrement: decrement.ok_or_else(|| missing("decrement"))?,
            cycle: cycle.unwrap_or(false),
            randomize: randomize.unwrap_or(false),
            require60: require60.unwrap_or(true),
            time_secs: time_secs.unwrap_or(60),
        })
    }

    pub fn game_opts(&self) -> GameOpts {
        GameOpts {
            correct_delta: self.increment,
            incorrect_delta: self.decrement,
            require_minimum_size: self.require60,
            time_limit_secs: self.time_secs,
        }
    }
}

fn parse_int(value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not readable as an integer"))
}

fn parse_secs(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not readable as a whole number of seconds"))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!(
            "'{value}' is not readable as a boolean, use 'true' or 'false'"
        )),
    }
}
