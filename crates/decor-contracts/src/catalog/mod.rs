mod rooms;
mod styles;

pub use rooms::{RoomCatalog, RoomKind, RoomSpec};
pub use styles::{StyleCatalog, StyleKind, StyleSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {catalog} '{value}'")]
pub struct UnknownCatalogEntry {
    pub catalog: &'static str,
    pub value: String,
}

/// Lower-cases and folds `-`/space separators into `_` so `Living Room`,
/// `living-room` and `living_room` resolve to the same entry.
pub(crate) fn normalize_slug(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
