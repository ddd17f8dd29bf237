//! Game (session) name validation.

use regex::Regex;
use std::sync::LazyLock;

use crate::cell::NAME_MAX_LENGTH;

static GAME_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([-_.]?[a-zA-Z0-9])*$").unwrap());

/// Alphanumeric runs joined by single `-`, `_` or `.`, at most 255 bytes.
pub fn is_valid_game_name(name: &str) -> bool {
    name.len() <= NAME_MAX_LENGTH && GAME_NAME_RE.is_match(name)
}
