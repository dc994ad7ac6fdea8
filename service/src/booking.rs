use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use dao::booking::BookingEntity;
use mockall::automock;
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

/// One user's reservation of one concrete occurrence of a recurring block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub schedule_time_block_id: Uuid,
    pub user_id: Uuid,
    pub booking_date: Date,
    pub created: Option<PrimitiveDateTime>,
}

impl From<&BookingEntity> for Booking {
    fn from(entity: &BookingEntity) -> Self {
        Self {
            id: entity.id,
            schedule_time_block_id: entity.schedule_time_block_id,
            user_id: entity.user_id,
            booking_date: entity.booking_date,
            created: Some(entity.created),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub schedule_time_block_id: Uuid,
    pub booking_date: Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetFilter {
    pub day_of_week: Option<DayOfWeek>,
    pub time_block_id: Option<Uuid>,
}

#[automock(type Context=(); type Transaction = dao::MockTransaction;)]
#[async_trait]
pub trait BookingService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    /// Books every requested occurrence for `user_id` inside one
    /// transaction. The whole batch is rejected on the first failing
    /// request; partial acceptance never happens.
    async fn reserve_many(
        &self,
        requests: &[BookingRequest],
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Booking]>, ServiceError>;

    /// Deletes the caller's own booking. Cancelling twice fails with
    /// `BookingNotFound` instead of succeeding silently.
    async fn cancel(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    /// Administrator bulk delete of bookings under a schedule. The optional
    /// `reason` is logged but not persisted.
    async fn reset_bookings(
        &self,
        schedule_id: Uuid,
        filter: &ResetFilter,
        reason: Option<Arc<str>>,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u64, ServiceError>;
}
