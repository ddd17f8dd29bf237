//! Per-cell conflict resolution.
//!
//! Every grid position is a last-writer-wins register ordered by a
//! client-supplied logical clock. Ties keep the stored value, so replaying or
//! reordering updates converges on the same board.

use serde::{Deserialize, Serialize};

/// Maximum length (in characters) of display names and cell authors.
pub const NAME_MAX_LENGTH: usize = 255;

/// A single grid position as stored on disk and sent to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub solid: bool,
    #[serde(rename = "char")]
    pub letter: String,
    pub certain: bool,
    pub author: String,
    pub time: u64,
}

/// One element of an inbound `update` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CellUpdate {
    #[serde(rename = "char")]
    pub letter: String,
    pub certain: bool,
    pub author: String,
    pub time: u64,
}

impl Cell {
    /// A fresh, unattributed cell at clock zero.
    pub fn empty(solid: bool) -> Self {
        Self {
            solid,
            ..Default::default()
        }
    }

    /// Apply an update to this register.
    ///
    /// Returns the committed cell, or `None` when the update is stale or would
    /// not change `char`, `certain` or `author`.
    pub fn apply(&self, incoming: &CellUpdate) -> Option<Cell> {
        if incoming.time <= self.time {
            return None;
        }

        let (letter, certain, author) = match normalize_letter(&incoming.letter) {
            Some(letter) if !self.solid => {
                if letter == self.letter {
                    (letter, incoming.certain, self.author.clone())
                } else {
                    (letter, incoming.certain, truncate_name(&incoming.author))
                }
            }
            _ => (String::new(), false, String::new()),
        };

        if letter == self.letter && certain == self.certain && author == self.author {
            return None;
        }

        Some(Cell {
            solid: self.solid,
            letter,
            certain,
            author,
            time: incoming.time,
        })
    }
}

/// Upper-case the first character and accept it only if it is one of `A`-`Z`.
fn normalize_letter(raw: &str) -> Option<String> {
    let first = raw.chars().next()?;
    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(c @ 'A'..='Z'), None) => Some(c.to_string()),
        _ => None,
    }
}

/// Cut a display name down to [`NAME_MAX_LENGTH`] characters.
pub fn truncate_name(name: &str) -> String {
    match name.char_indices().nth(NAME_MAX_LENGTH) {
        Some((idx, _)) => name[..idx].to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(letter: &str, certain: bool, author: &str, time: u64) -> CellUpdate {
        CellUpdate {
            letter: letter.into(),
            certain,
            author: author.into(),
            time,
        }
    }

    #[test]
    fn newer_letter_is_committed() {
        let cell = Cell::empty(false);
        let next = cell.apply(&update("A", true, "bob", 1)).unwrap();
        assert_eq!(next.letter, "A");
        assert_eq!(next.author, "bob");
        assert!(next.certain);
        assert_eq!(next.time, 1);
    }

    #[test]
    fn stale_and_equal_clocks_are_rejected() {
        let cell = Cell::empty(false).apply(&update("A", true, "bob", 1)).unwrap();
        assert!(cell.apply(&update("B", true, "eve", 1)).is_none());
        assert!(cell.apply(&update("B", true, "eve", 0)).is_none());
    }

    #[test]
    fn reapplying_the_same_update_is_a_no_op() {
        let u = update("Q", false, "ann", 7);
        let once = Cell::empty(false).apply(&u).unwrap();
        assert!(once.apply(&u).is_none());
    }

    #[test]
    fn reconfirming_a_letter_keeps_credit() {
        let cell = Cell::empty(false).apply(&update("A", true, "bob", 1)).unwrap();
        let next = cell.apply(&update("a", false, "eve", 2)).unwrap();
        assert_eq!(next.letter, "A");
        assert_eq!(next.author, "bob");
        assert!(!next.certain);
        assert_eq!(next.time, 2);
    }

    #[test]
    fn content_identical_write_does_not_refresh_clock() {
        let cell = Cell::empty(false).apply(&update("A", true, "bob", 1)).unwrap();
        assert!(cell.apply(&update("A", true, "eve", 9)).is_none());
    }

    #[test]
    fn solid_cells_never_take_content() {
        let cell = Cell::empty(true);
        assert!(cell.apply(&update("A", true, "bob", 1)).is_none());
        assert!(cell.apply(&update("Z", false, "eve", 50)).is_none());
        assert_eq!(cell, Cell::empty(true));
    }

    #[test]
    fn invalid_letters_clear_the_cell() {
        let cell = Cell::empty(false).apply(&update("K", true, "bob", 1)).unwrap();
        for (i, raw) in ["", "1", "?", "é", "ß"].iter().enumerate() {
            let cleared = cell.apply(&update(raw, true, "eve", 2 + i as u64)).unwrap();
            assert_eq!(cleared.letter, "");
            assert_eq!(cleared.author, "");
            assert!(!cleared.certain);
        }
    }

    #[test]
    fn only_the_first_character_counts() {
        let next = Cell::empty(false).apply(&update("xyz", false, "bob", 3)).unwrap();
        assert_eq!(next.letter, "X");
    }

    #[test]
    fn authors_are_truncated() {
        let long = "n".repeat(NAME_MAX_LENGTH + 40);
        let next = Cell::empty(false).apply(&update("A", false, &long, 1)).unwrap();
        assert_eq!(next.author.chars().count(), NAME_MAX_LENGTH);
    }

    #[test]
    fn reordered_updates_converge() {
        let a = update("C", false, "bob", 4);
        let b = update("D", true, "eve", 6);

        let forward = Cell::empty(false).apply(&a).unwrap().apply(&b).unwrap();
        let start = Cell::empty(false).apply(&b).unwrap();
        let backward = start.apply(&a).unwrap_or(start);

        assert_eq!(forward, backward);
        assert_eq!(forward.time, 6);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut cell = Cell::empty(false);
        let mut highest = 0;
        for t in [3u64, 1, 8, 8, 2, 12, 5] {
            let letter = ((b'A' + (t % 5) as u8) as char).to_string();
            if let Some(next) = cell.apply(&update(&letter, false, "x", t)) {
                assert!(next.time > cell.time);
                highest = next.time;
                cell = next;
            }
        }
        assert_eq!(cell.time, highest);
        assert_eq!(cell.time, 12);
    }
}
