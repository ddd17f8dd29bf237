//! The sanitized state that is sent to every client.

use serde::Serialize;

use crate::board::Board;
use crate::cell::Cell;

/// Broadcastable projection of a session.
///
/// Carries display names only, never connection identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicView<'a> {
    pub failed: bool,
    pub width: u32,
    pub height: u32,
    pub grid: &'a [Cell],
    pub names: Vec<&'a str>,
    pub online: Vec<&'a str>,
}

impl<'a> PublicView<'a> {
    /// Project a session's state.
    ///
    /// `online` lists the display names of connected clients in connection
    /// order; anonymous (empty) names are skipped. `names` starts with the
    /// online names and continues with every other author on the board, each
    /// name appearing once.
    ///
    /// A session whose board failed to load yields an empty grid with
    /// `failed` set.
    pub fn build<I>(board: Option<&'a Board>, write_back_failed: bool, connected: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(board) = board else {
            return Self {
                failed: true,
                width: 0,
                height: 0,
                grid: &[],
                names: Vec::new(),
                online: Vec::new(),
            };
        };

        let mut online: Vec<&str> = Vec::new();
        for name in connected {
            if !name.is_empty() && !online.contains(&name) {
                online.push(name);
            }
        }

        let mut names = online.clone();
        for cell in board.cells() {
            let author = cell.author.as_str();
            if !author.is_empty() && !names.contains(&author) {
                names.push(author);
            }
        }

        Self {
            failed: write_back_failed,
            width: board.width(),
            height: board.height(),
            grid: board.cells(),
            names,
            online,
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings, integers and booleans are serialized.
        serde_json::to_string(self).unwrap_or_default()
    }
}
