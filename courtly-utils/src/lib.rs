pub mod date_utils;

pub use date_utils::{booking_window, CourtlyDateError, DayOfWeek};
