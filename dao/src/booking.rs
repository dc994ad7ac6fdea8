use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use mockall::automock;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

use crate::DaoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEntity {
    pub id: Uuid,
    pub schedule_time_block_id: Uuid,
    pub user_id: Uuid,
    pub booking_date: Date,
    pub created: PrimitiveDateTime,
}

/// Live booking count of one concrete occurrence of a recurring block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyEntity {
    pub schedule_time_block_id: Uuid,
    pub booking_date: Date,
    pub booked: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingResetFilter {
    pub day_of_week: Option<DayOfWeek>,
    pub schedule_time_block_id: Option<Uuid>,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait BookingDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<BookingEntity>, DaoError>;

    async fn find_by_occurrence_and_user(
        &self,
        schedule_time_block_id: Uuid,
        booking_date: Date,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<BookingEntity>, DaoError>;

    /// Booking counts per `(block, date)` for every block of the schedule
    /// within the inclusive date window.
    async fn occupancy_for_schedule(
        &self,
        schedule_id: Uuid,
        from: Date,
        until: Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OccupancyEntity]>, DaoError>;

    async fn find_for_user_in_window(
        &self,
        schedule_id: Uuid,
        user_id: Uuid,
        from: Date,
        until: Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[BookingEntity]>, DaoError>;

    /// Inserts the booking only while the occurrence still has free
    /// capacity. The count check and the insert are one guarded statement,
    /// so concurrent writers cannot both slip past the capacity limit.
    /// Returns `false` when the occurrence was already full.
    async fn create_within_capacity(
        &self,
        entity: &BookingEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<bool, DaoError>;

    async fn delete(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError>;

    /// Bulk delete of bookings under one schedule, optionally narrowed by
    /// weekday and/or block. Returns the number of deleted rows.
    async fn delete_for_schedule(
        &self,
        schedule_id: Uuid,
        filter: BookingResetFilter,
        tx: Self::Transaction,
    ) -> Result<u64, DaoError>;
}
