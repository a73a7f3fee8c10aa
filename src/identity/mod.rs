use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::orders::models::LineItemPlayerRef;
use crate::player::models::PlayerRecord;

/// Case-insensitive name comparison, ignoring surrounding whitespace.
/// Unicode-aware: "Müller" and "MÜLLER" are the same name.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Intra-guardian duplicate check: exact case-insensitive match on
/// (first, last, date of birth). Deliberately strict; no fuzzy matching,
/// so two distinct children sharing a name but not a birth date are
/// never merged.
///
/// Returns the index of the first matching record, skipping `skip_index`
/// so an edit does not collide with the record's own prior values.
pub fn find_duplicate(
    first_name: &str,
    last_name: &str,
    date_of_birth: NaiveDate,
    existing: &[PlayerRecord],
    skip_index: Option<usize>,
) -> Option<usize> {
    existing.iter().enumerate().find_map(|(i, record)| {
        if Some(i) == skip_index {
            return None;
        }
        (names_match(&record.first_name, first_name)
            && names_match(&record.last_name, last_name)
            && record.date_of_birth == date_of_birth)
            .then_some(i)
    })
}

/// Outcome of resolving an order line item against a guardian's roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome {
    /// Resolved unambiguously to one roster index
    Matched(usize),
    /// The stored index and the attendee name disagreed; the name match won
    /// and the stale index is carried for observability
    Ambiguous { resolved: usize, stale_index: usize },
    /// Nothing usable; contributes zero to any count, never an error
    Unattributed,
}

impl CorrelationOutcome {
    pub fn resolved_index(&self) -> Option<usize> {
        match self {
            CorrelationOutcome::Matched(index) => Some(*index),
            CorrelationOutcome::Ambiguous { resolved, .. } => Some(*resolved),
            CorrelationOutcome::Unattributed => None,
        }
    }
}

/// Resolves a line item's player reference to an index in the roster.
///
/// Precedence: the stable player id is authoritative when present and still
/// on the roster. Otherwise the legacy signals apply: an in-bounds stored
/// index is used when the attendee name agrees or is absent; when the two
/// disagree the name match wins, since a stored index goes stale as soon as
/// an earlier record is deleted. Conflicts are logged, not raised.
pub fn resolve_line_item(
    reference: &LineItemPlayerRef,
    roster: &[PlayerRecord],
) -> CorrelationOutcome {
    if let Some(player_id) = reference.player_id {
        if let Some(index) = roster.iter().position(|r| r.id == player_id) {
            return CorrelationOutcome::Matched(index);
        }
        debug!(%player_id, "Line item references a player id no longer on the roster");
    }

    let name_index = reference.assigned_attendee_name.as_deref().and_then(|name| {
        roster.iter().position(|r| names_match(&r.full_name(), name))
    });

    let stored_index = reference.record_index.filter(|&i| i < roster.len());

    match (stored_index, name_index) {
        (Some(stored), Some(named)) if stored == named => CorrelationOutcome::Matched(stored),
        (Some(stored), Some(named)) => {
            warn!(
                stored_index = stored,
                name_index = named,
                attendee_name = reference.assigned_attendee_name.as_deref().unwrap_or(""),
                "Stale line-item index disagrees with attendee name; name match wins"
            );
            CorrelationOutcome::Ambiguous {
                resolved: named,
                stale_index: stored,
            }
        }
        (None, Some(named)) => CorrelationOutcome::Matched(named),
        (Some(stored), None) => CorrelationOutcome::Matched(stored),
        (None, None) => CorrelationOutcome::Unattributed,
    }
}
