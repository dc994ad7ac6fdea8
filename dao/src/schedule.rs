use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use mockall::automock;
use time::{PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::DaoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntity {
    pub id: Uuid,
    pub created: PrimitiveDateTime,
    pub version: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTimeBlockEntity {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start: Time,
    pub end: Time,
    pub capacity: u32,
    pub enabled: bool,
    pub version: Uuid,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait ScheduleDao {
    type Transaction: crate::Transaction;

    async fn create_schedule(
        &self,
        entity: &ScheduleEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;

    async fn find_schedule(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ScheduleEntity>, DaoError>;

    /// Removes the schedule with its time blocks and every booking made
    /// against them.
    async fn delete_schedule(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError>;

    async fn create_block(
        &self,
        entity: &ScheduleTimeBlockEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;

    async fn blocks_for_schedule(
        &self,
        schedule_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ScheduleTimeBlockEntity]>, DaoError>;

    async fn find_block(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ScheduleTimeBlockEntity>, DaoError>;

    /// Updates capacity and enabled flag of an existing block. The block id
    /// and its `(day_of_week, start, end)` shape never change after creation.
    async fn update_block(
        &self,
        entity: &ScheduleTimeBlockEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError>;
}
