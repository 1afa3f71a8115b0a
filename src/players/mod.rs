use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The two player collections held in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Batters,
    Pitchers,
}

impl PlayerKind {
    /// Store path of the collection.
    pub fn collection(self) -> &'static str {
        match self {
            PlayerKind::Batters => "batters",
            PlayerKind::Pitchers => "pitchers",
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// A player document as stored upstream. Only `Name` and `ID` are read; the
/// rest of the stat line is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Player {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A player located by name, tagged with the collection it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatch {
    pub kind: PlayerKind,
    pub player: Player,
}

/// Canonical comparison key for a display name.
///
/// Lower-cases, drops anything that isn't an ASCII letter, digit or
/// whitespace, then collapses whitespace runs to one space and trims.
pub fn normalize_name(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Find the first player whose normalized name equals `target`'s, scanning
/// batters before pitchers in stored order.
pub fn find_player(target: &str, batters: Vec<Player>, pitchers: Vec<Player>) -> Option<PlayerMatch> {
    let key = normalize_name(target);

    let tagged_batters = batters.into_iter().map(|p| (PlayerKind::Batters, p));
    let tagged_pitchers = pitchers.into_iter().map(|p| (PlayerKind::Pitchers, p));

    tagged_batters
        .chain(tagged_pitchers)
        .find(|(_, player)| normalize_name(&player.name) == key)
        .map(|(kind, player)| PlayerMatch { kind, player })
}
