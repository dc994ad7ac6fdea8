use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use time::{Date, Time};
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No enabled block recurs at this weekday and start time.
    Disabled,
    /// The requesting user already holds this occurrence.
    Booked,
    /// Booked out for everyone else.
    Full,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityCell {
    pub date: Date,
    pub state: SlotState,
    /// Reference to the template block backing this cell, also for disabled
    /// blocks; `None` when the template has no block here at all.
    pub block_id: Option<Uuid>,
    pub booked_count: u32,
    pub capacity: u32,
}

/// One start time of the weekly grid with its seven date cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityRow {
    pub start: Time,
    pub end: Time,
    pub cells: Vec<AvailabilityCell>,
}

/// The projected 7-day view: rows are the distinct start times of the
/// template sorted ascending, columns the dates `[from, from + 6]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityWeek {
    pub schedule_id: Uuid,
    pub from: Date,
    pub rows: Vec<AvailabilityRow>,
}

#[automock(type Context=(); type Transaction = dao::MockTransaction;)]
#[async_trait]
pub trait AvailabilityService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    /// Resolves the rolling week starting at `today` against the template
    /// and the live booking counts, from the point of view of `user_id`.
    async fn get_week(
        &self,
        schedule_id: Uuid,
        user_id: Uuid,
        today: Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<AvailabilityWeek, ServiceError>;
}
