/**
 * History Cursors
 *
 * A cursor names a position in one room's log. Two forms exist because log
 * backends have handed out two kinds of positions over time:
 *
 * - `Offset(n)` - the per-room sequence number of an entry (1-based)
 * - `Id(uuid)` - the time-sortable entry id of an entry
 *
 * Cursors are exclusive lower bounds: a range "from" a cursor starts with
 * the entry after it. `Offset(0)` and `Id(nil)` both mean "before the oldest
 * retained entry". Cursors are only comparable within their own form.
 */
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::shared::message::is_plausible_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    Offset(u64),
    Id(Uuid),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid cursor '{0}': expected a message id or a non-negative integer")]
pub struct CursorError(pub String);

impl Cursor {
    /// The start of a room's log
    pub const START: Cursor = Cursor::Offset(0);

    /// Whether this cursor points before the oldest retained entry
    pub fn is_start(&self) -> bool {
        match self {
            Cursor::Offset(n) => *n == 0,
            Cursor::Id(id) => id.is_nil(),
        }
    }

    /// Parse an optional cursor as received from a client
    ///
    /// A missing or blank value means "no cursor".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Cursor>, CursorError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    /// UUIDs are tried first, integers second.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Ok(id) = Uuid::parse_str(raw) {
            return Ok(Cursor::Id(id));
        }
        raw.parse::<u64>()
            .map(Cursor::Offset)
            .map_err(|_| CursorError(raw.to_string()))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Offset(n) => write!(f, "{n}"),
            Cursor::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Pick the entry id for a new log entry
///
/// Entry ids must strictly increase within a room. The message id is used
/// when it is a plausible UUIDv7 that sorts after the previous entry; an
/// implausible one is replaced by a fresh server id first. When the
/// candidate does not sort after the previous entry, the previous id plus one
/// is used, which keeps the millisecond prefix of a UUIDv7.
///
/// Returns `None` only when the previous id is the largest UUID, which
/// nothing can follow.
pub fn next_entry_id(last: Option<Uuid>, candidate: Uuid) -> Option<Uuid> {
    let candidate = if is_plausible_id(candidate) {
        candidate
    } else {
        Uuid::now_v7()
    };
    match last {
        Some(last) if candidate <= last => last.as_u128().checked_add(1).map(Uuid::from_u128),
        _ => Some(candidate),
    }
}
