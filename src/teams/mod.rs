use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

const BUILTIN_TEAMS: &str = include_str!("../../config/teams.toml");

#[derive(Debug, Error)]
pub enum TeamTableError {
    #[error("failed to read team table {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse team table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("team `{team}` has invalid code `{code}` (expected three uppercase letters)")]
    InvalidCode { team: String, code: String },
}

// Raw structure to parse TOML directly
#[derive(Debug, Deserialize)]
struct TeamTableRaw {
    teams: HashMap<String, String>,
}

/// Immutable mapping of franchise display names to their three-letter codes.
///
/// Lookups are exact and case-sensitive. Several names may share one code.
#[derive(Debug, Clone)]
pub struct TeamTable {
    codes: HashMap<String, String>,
}

impl TeamTable {
    /// The table compiled into the binary from `config/teams.toml`.
    pub fn builtin() -> Result<Self, TeamTableError> {
        Self::from_toml_str(BUILTIN_TEAMS)
    }

    /// Load a team table from a TOML file on disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TeamTableError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| TeamTableError::Read {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TeamTableError> {
        let raw: TeamTableRaw = toml::from_str(content)?;

        for (team, code) in &raw.teams {
            let valid = code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase());
            if !valid {
                return Err(TeamTableError::InvalidCode {
                    team: team.clone(),
                    code: code.clone(),
                });
            }
        }

        Ok(Self { codes: raw.teams })
    }

    /// Resolve a team name to its code, or `None` for an unrecognized team.
    pub fn code_for(&self, team_name: &str) -> Option<&str> {
        self.codes.get(team_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_loads() {
        let table = TeamTable::builtin().unwrap();
        assert_eq!(table.len(), 21);
        assert_eq!(table.code_for("Denver Blucifers"), Some("DEN"));
    }

    #[test]
    fn test_renamed_franchise_shares_code() {
        let table = TeamTable::builtin().unwrap();
        assert_eq!(table.code_for("Curacao Blue Wave"), Some("SPA"));
        assert_eq!(table.code_for("Sao Paulo Black Mambas"), Some("SPA"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = TeamTable::builtin().unwrap();
        assert_eq!(table.code_for("Nonexistent Team"), None);
        assert_eq!(table.code_for("denver blucifers"), None);
        assert_eq!(table.code_for("Denver Blucifers "), None);
    }

    #[test]
    fn test_rejects_bad_code() {
        let err = TeamTable::from_toml_str("[teams]\n\"Somewhere\" = \"sw\"\n").unwrap_err();
        assert!(matches!(err, TeamTableError::InvalidCode { .. }));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = TeamTable::from_toml_str("teams = [").unwrap_err();
        assert!(matches!(err, TeamTableError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = TeamTable::load_from_file("config/does_not_exist.toml").unwrap_err();
        assert!(matches!(err, TeamTableError::Read { .. }));
    }
}
