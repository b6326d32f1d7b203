//! Navigation targets offered under the particle field

use serde::{Deserialize, Serialize};

/// Shown under the buttons
pub const HINT: &str = "Move your cursor or touch to interact";

/// Sibling mini-apps reachable from the landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Tetris,
    TicTacToe,
    Calculator,
}

impl Destination {
    /// Display order
    pub const ALL: [Destination; 3] = [Self::Tetris, Self::TicTacToe, Self::Calculator];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tetris => "Tetris",
            Self::TicTacToe => "Tic-Tac-Toe",
            Self::Calculator => "Calculator",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Self::Tetris => "/tetris",
            Self::TicTacToe => "/tic-tac-toe",
            Self::Calculator => "/calculator",
        }
    }

    /// Button gradient stops (left, right)
    pub fn accent(&self) -> (&'static str, &'static str) {
        match self {
            Self::Tetris => ("#a855f7", "#3b82f6"),
            Self::TicTacToe => ("#22c55e", "#14b8a6"),
            Self::Calculator => ("#ec4899", "#ef4444"),
        }
    }

    /// Key used in `data-nav` attributes
    pub fn key(&self) -> &'static str {
        &self.route()[1..]
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}
