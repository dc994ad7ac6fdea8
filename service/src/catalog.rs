use time::macros::time;
use time::Time;

/// One entry of the fixed daily time-block vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u8,
    pub start: Time,
    pub end: Time,
}

/// The facility-wide block grid: 19 blocks of 35 minutes with a 10 minute
/// gap between them, from early morning to late evening. Defined once at
/// build time and shared by every resource.
const STANDARD_ENTRIES: [CatalogEntry; 19] = [
    CatalogEntry { id: 1, start: time!(8:15), end: time!(8:50) },
    CatalogEntry { id: 2, start: time!(9:00), end: time!(9:35) },
    CatalogEntry { id: 3, start: time!(9:45), end: time!(10:20) },
    CatalogEntry { id: 4, start: time!(10:30), end: time!(11:05) },
    CatalogEntry { id: 5, start: time!(11:15), end: time!(11:50) },
    CatalogEntry { id: 6, start: time!(12:00), end: time!(12:35) },
    CatalogEntry { id: 7, start: time!(12:45), end: time!(13:20) },
    CatalogEntry { id: 8, start: time!(13:30), end: time!(14:05) },
    CatalogEntry { id: 9, start: time!(14:15), end: time!(14:50) },
    CatalogEntry { id: 10, start: time!(15:00), end: time!(15:35) },
    CatalogEntry { id: 11, start: time!(15:45), end: time!(16:20) },
    CatalogEntry { id: 12, start: time!(16:30), end: time!(17:05) },
    CatalogEntry { id: 13, start: time!(17:15), end: time!(17:50) },
    CatalogEntry { id: 14, start: time!(18:00), end: time!(18:35) },
    CatalogEntry { id: 15, start: time!(18:45), end: time!(19:20) },
    CatalogEntry { id: 16, start: time!(19:30), end: time!(20:05) },
    CatalogEntry { id: 17, start: time!(20:15), end: time!(20:50) },
    CatalogEntry { id: 18, start: time!(21:00), end: time!(21:35) },
    CatalogEntry { id: 19, start: time!(21:45), end: time!(22:20) },
];

/// Immutable, ordered, non-overlapping list of bookable daily time ranges.
/// Every schedule template block must match one entry exactly.
#[derive(Debug, Clone, Copy)]
pub struct TimeBlockCatalog {
    entries: &'static [CatalogEntry],
}

impl TimeBlockCatalog {
    pub const fn standard() -> Self {
        Self {
            entries: &STANDARD_ENTRIES,
        }
    }

    /// Catalog over a custom entry table. Tests use this to keep fixtures
    /// small.
    pub const fn with_entries(entries: &'static [CatalogEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        self.entries
    }

    pub fn is_valid_block(&self, start: Time, end: Time) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.start == start && entry.end == end)
    }

    pub fn entry_for_start(&self, start: Time) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.start == start)
    }
}

impl Default for TimeBlockCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
