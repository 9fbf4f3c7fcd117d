//! The role of whoever is looking at the game state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

/// Who a view is computed for, and who a message is addressed to.
///
/// The administrator is an explicit role rather than a reserved player id, so
/// no real player can ever collide with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "playerId", rename_all = "camelCase")]
pub enum Viewer {
    /// The game master. Sees everything.
    Admin,
    /// A player. Sees only what has been revealed on characters they own.
    Player(PlayerId),
}

impl Viewer {
    /// Returns `true` for the administrator.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the player id, or `None` for the administrator.
    #[must_use]
    pub fn player_id(self) -> Option<PlayerId> {
        match self {
            Self::Admin => None,
            Self::Player(id) => Some(id),
        }
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Player(id) => write!(f, "player:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_distinguishes_admin_from_players() {
        assert_eq!(Viewer::Admin.to_string(), "admin");
        assert_eq!(Viewer::Player(PlayerId(0)).to_string(), "player:0");
    }

    #[test]
    fn test_player_zero_is_not_admin() {
        let viewer = Viewer::Player(PlayerId(0));
        assert!(!viewer.is_admin());
        assert_eq!(viewer.player_id(), Some(PlayerId(0)));
    }
}
