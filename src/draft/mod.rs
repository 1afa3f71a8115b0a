use once_cell::sync::Lazy;
use regex::Regex;

/// Matches announcements of the form
/// `Round 3, Pick 12 (#56 overall): Denver Blucifers select P Bill Muncey`.
///
/// Keywords are case-insensitive; the position token is not. The match may
/// start anywhere, so forwarded or prefixed announcements still parse.
static DRAFT_PICK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:round)\s+([0-9]+)\s*,\s*(?i:pick)\s+([0-9]+)\s*\(#[0-9]+\s+(?i:overall)\):\s*(\S.*?)\s+(?i:select)\s+([A-Z]+(?:/[A-Z]+)?)\s+(\S(?s:.*))$",
    )
    .expect("draft pick pattern is valid")
});

/// A single pick announced in the draft channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPickEvent {
    pub round: u32,
    pub pick: u32,
    pub team_name: String,
    pub position: String,
    pub player_name: String,
}

/// Parse a draft announcement.
///
/// Returns `None` when the text is not a draft pick, which is the common case
/// for chat traffic. A returned event always has every field populated.
pub fn parse_draft_pick(text: &str) -> Option<DraftPickEvent> {
    let captures = DRAFT_PICK_PATTERN.captures(text)?;

    let round = captures[1].parse::<u32>().ok().filter(|n| *n >= 1)?;
    let pick = captures[2].parse::<u32>().ok().filter(|n| *n >= 1)?;
    let team_name = captures[3].trim().to_string();
    let position = captures[4].to_string();
    let player_name = captures[5].trim().to_string();

    if team_name.is_empty() || player_name.is_empty() {
        return None;
    }

    Some(DraftPickEvent {
        round,
        pick,
        team_name,
        position,
        player_name,
    })
}
