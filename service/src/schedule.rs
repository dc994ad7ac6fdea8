use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use dao::schedule::ScheduleTimeBlockEntity;
use mockall::automock;
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

/// Weekly availability template of one bookable resource, together with its
/// time blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub id: Uuid,
    pub created: Option<PrimitiveDateTime>,
    pub blocks: Arc<[ScheduleTimeBlock]>,
    pub version: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTimeBlock {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start: Time,
    pub end: Time,
    pub capacity: u32,
    pub enabled: bool,
    pub version: Uuid,
}

impl ScheduleTimeBlock {
    /// A disabled block never accepts bookings, whatever capacity is stored.
    pub fn effective_capacity(&self) -> u32 {
        if self.enabled {
            self.capacity
        } else {
            0
        }
    }
}

impl From<&ScheduleTimeBlockEntity> for ScheduleTimeBlock {
    fn from(entity: &ScheduleTimeBlockEntity) -> Self {
        Self {
            id: entity.id,
            schedule_id: entity.schedule_id,
            day_of_week: entity.day_of_week,
            start: entity.start,
            end: entity.end,
            capacity: entity.capacity,
            enabled: entity.enabled,
            version: entity.version,
        }
    }
}
impl From<&ScheduleTimeBlock> for ScheduleTimeBlockEntity {
    fn from(block: &ScheduleTimeBlock) -> Self {
        Self {
            id: block.id,
            schedule_id: block.schedule_id,
            day_of_week: block.day_of_week,
            start: block.start,
            end: block.end,
            capacity: block.capacity,
            enabled: block.enabled,
            version: block.version,
        }
    }
}

/// Locally assembled template edit, committed as one unit. The engine never
/// observes intermediate edit states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub blocks: Vec<ScheduleBlockDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlockDraft {
    pub day_of_week: DayOfWeek,
    pub start: Time,
    pub end: Time,
    pub capacity: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub updated_count: usize,
}

#[automock(type Context=(); type Transaction = dao::MockTransaction;)]
#[async_trait]
pub trait ScheduleService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn create_schedule(
        &self,
        draft: &ScheduleDraft,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Schedule, ServiceError>;

    async fn get_schedule(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Schedule, ServiceError>;

    async fn update_schedule(
        &self,
        id: Uuid,
        draft: &ScheduleDraft,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<ScheduleUpdate, ServiceError>;

    async fn delete_schedule(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}
