use courtly_utils::DayOfWeek;
use thiserror::Error;
use time::{Date, Time};
use uuid::Uuid;

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod clock;
pub mod permission;
pub mod schedule;
pub mod user_service;
pub mod uuid_service;

pub use permission::{MockPermissionService, PermissionService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] dao::DaoError),

    #[error("Forbidden")]
    Forbidden,

    #[error("Schedule {0} not found")]
    ScheduleNotFound(Uuid),

    #[error("Time block {0} not found")]
    TimeBlockNotFound(Uuid),

    #[error("Time block {0} is disabled")]
    TimeBlockDisabled(Uuid),

    #[error("Time range {0} - {1} is not a catalog block")]
    InvalidTimeBlock(Time, Time),

    #[error("Time block starting {1} on {0} submitted more than once")]
    DuplicateTimeBlockDefinition(DayOfWeek, Time),

    #[error("No free capacity left on block {0} for {1}")]
    CapacityExceeded(Uuid, Date),

    #[error("User already holds block {0} on {1}")]
    DuplicateBooking(Uuid, Date),

    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("Booking date {date} falls on {got} but the block recurs on {expected}")]
    DateDayMismatch {
        date: Date,
        expected: DayOfWeek,
        got: DayOfWeek,
    },
}
