use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use dao::schedule::{ScheduleEntity, ScheduleTimeBlockEntity};
use service::catalog::TimeBlockCatalog;
use service::permission::{Authentication, ADMIN_PRIVILEGE};
use service::schedule::{
    Schedule, ScheduleDraft, ScheduleService, ScheduleTimeBlock, ScheduleUpdate,
};
use service::ServiceError;
use time::Time;
use uuid::Uuid;

const SCHEDULE_SERVICE_PROCESS: &str = "schedule-service";

pub struct ScheduleServiceImpl<ScheduleDao, PermissionService, ClockService, UuidService, TransactionDao>
where
    ScheduleDao: dao::schedule::ScheduleDao + Send + Sync,
    PermissionService: service::PermissionService + Send + Sync,
    ClockService: service::clock::ClockService + Send + Sync,
    UuidService: service::uuid_service::UuidService + Send + Sync,
    TransactionDao: dao::TransactionDao<Transaction = ScheduleDao::Transaction> + Send + Sync,
{
    pub schedule_dao: Arc<ScheduleDao>,
    pub permission_service: Arc<PermissionService>,
    pub clock_service: Arc<ClockService>,
    pub uuid_service: Arc<UuidService>,
    pub transaction_dao: Arc<TransactionDao>,
    pub catalog: TimeBlockCatalog,
}
impl<ScheduleDao, PermissionService, ClockService, UuidService, TransactionDao>
    ScheduleServiceImpl<ScheduleDao, PermissionService, ClockService, UuidService, TransactionDao>
where
    ScheduleDao: dao::schedule::ScheduleDao + Send + Sync,
    PermissionService: service::PermissionService + Send + Sync,
    ClockService: service::clock::ClockService + Send + Sync,
    UuidService: service::uuid_service::UuidService + Send + Sync,
    TransactionDao: dao::TransactionDao<Transaction = ScheduleDao::Transaction> + Send + Sync,
{
    pub fn new(
        schedule_dao: Arc<ScheduleDao>,
        permission_service: Arc<PermissionService>,
        clock_service: Arc<ClockService>,
        uuid_service: Arc<UuidService>,
        transaction_dao: Arc<TransactionDao>,
        catalog: TimeBlockCatalog,
    ) -> Self {
        Self {
            schedule_dao,
            permission_service,
            clock_service,
            uuid_service,
            transaction_dao,
            catalog,
        }
    }

    /// Catalog and duplicate validation of a submitted draft. Runs before
    /// any transaction is opened, so a rejected draft persists nothing.
    fn validate_draft(&self, draft: &ScheduleDraft) -> Result<(), ServiceError> {
        let mut seen: HashSet<(DayOfWeek, Time, Time)> = HashSet::with_capacity(draft.blocks.len());
        for block in &draft.blocks {
            if !self.catalog.is_valid_block(block.start, block.end) {
                return Err(ServiceError::InvalidTimeBlock(block.start, block.end));
            }
            if !seen.insert((block.day_of_week, block.start, block.end)) {
                return Err(ServiceError::DuplicateTimeBlockDefinition(
                    block.day_of_week,
                    block.start,
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<ScheduleDao, PermissionService, ClockService, UuidService, TransactionDao> ScheduleService
    for ScheduleServiceImpl<ScheduleDao, PermissionService, ClockService, UuidService, TransactionDao>
where
    ScheduleDao: dao::schedule::ScheduleDao + Send + Sync,
    PermissionService: service::PermissionService + Send + Sync,
    ClockService: service::clock::ClockService + Send + Sync,
    UuidService: service::uuid_service::UuidService + Send + Sync,
    TransactionDao: dao::TransactionDao<Transaction = ScheduleDao::Transaction> + Send + Sync,
{
    type Context = PermissionService::Context;
    type Transaction = ScheduleDao::Transaction;

    async fn create_schedule(
        &self,
        draft: &ScheduleDraft,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Schedule, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        self.validate_draft(draft)?;

        let tx = self.transaction_dao.use_transaction(tx).await?;

        let schedule_entity = ScheduleEntity {
            id: self.uuid_service.new_uuid("schedule-id"),
            created: self.clock_service.date_time_now(),
            version: self.uuid_service.new_uuid("schedule-version"),
        };
        self.schedule_dao
            .create_schedule(&schedule_entity, SCHEDULE_SERVICE_PROCESS, tx.clone())
            .await?;

        let mut blocks = Vec::with_capacity(draft.blocks.len());
        for block in &draft.blocks {
            let block_entity = ScheduleTimeBlockEntity {
                id: self.uuid_service.new_uuid("schedule-block-id"),
                schedule_id: schedule_entity.id,
                day_of_week: block.day_of_week,
                start: block.start,
                end: block.end,
                capacity: if block.enabled { block.capacity } else { 0 },
                enabled: block.enabled,
                version: self.uuid_service.new_uuid("schedule-block-version"),
            };
            self.schedule_dao
                .create_block(&block_entity, SCHEDULE_SERVICE_PROCESS, tx.clone())
                .await?;
            blocks.push(ScheduleTimeBlock::from(&block_entity));
        }
        blocks.sort_by_key(|block| (block.day_of_week, block.start));

        self.transaction_dao.commit(tx).await?;
        tracing::info!(schedule = %schedule_entity.id, blocks = blocks.len(), "schedule created");

        Ok(Schedule {
            id: schedule_entity.id,
            created: Some(schedule_entity.created),
            blocks: blocks.into(),
            version: schedule_entity.version,
        })
    }

    async fn get_schedule(
        &self,
        id: Uuid,
        _context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Schedule, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;

        let schedule_entity = self
            .schedule_dao
            .find_schedule(id, tx.clone())
            .await?
            .ok_or(ServiceError::ScheduleNotFound(id))?;
        let mut blocks: Vec<ScheduleTimeBlock> = self
            .schedule_dao
            .blocks_for_schedule(id, tx.clone())
            .await?
            .iter()
            .map(ScheduleTimeBlock::from)
            .collect();
        blocks.sort_by_key(|block| (block.day_of_week, block.start));

        self.transaction_dao.commit(tx).await?;

        Ok(Schedule {
            id: schedule_entity.id,
            created: Some(schedule_entity.created),
            blocks: blocks.into(),
            version: schedule_entity.version,
        })
    }

    async fn update_schedule(
        &self,
        id: Uuid,
        draft: &ScheduleDraft,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<ScheduleUpdate, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        self.validate_draft(draft)?;

        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.schedule_dao
            .find_schedule(id, tx.clone())
            .await?
            .ok_or(ServiceError::ScheduleNotFound(id))?;
        let existing = self.schedule_dao.blocks_for_schedule(id, tx.clone()).await?;
        let by_shape: HashMap<(DayOfWeek, Time, Time), &ScheduleTimeBlockEntity> = existing
            .iter()
            .map(|block| ((block.day_of_week, block.start, block.end), block))
            .collect();

        let mut updated_count = 0;
        for block in &draft.blocks {
            // Blocks not present at creation time are skipped, never
            // inserted: the weekly grid keeps its original shape and block
            // ids stay stable for existing bookings.
            let Some(existing_block) = by_shape.get(&(block.day_of_week, block.start, block.end))
            else {
                continue;
            };
            let next = ScheduleTimeBlockEntity {
                capacity: if block.enabled { block.capacity } else { 0 },
                enabled: block.enabled,
                version: self.uuid_service.new_uuid("schedule-block-version"),
                ..(*existing_block).clone()
            };
            self.schedule_dao
                .update_block(&next, SCHEDULE_SERVICE_PROCESS, tx.clone())
                .await?;
            updated_count += 1;
        }

        self.transaction_dao.commit(tx).await?;
        tracing::info!(schedule = %id, updated_count, "schedule updated");
        Ok(ScheduleUpdate { updated_count })
    }

    async fn delete_schedule(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;

        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.schedule_dao
            .find_schedule(id, tx.clone())
            .await?
            .ok_or(ServiceError::ScheduleNotFound(id))?;
        self.schedule_dao.delete_schedule(id, tx.clone()).await?;
        self.transaction_dao.commit(tx).await?;
        tracing::info!(schedule = %id, "schedule deleted");
        Ok(())
    }
}
