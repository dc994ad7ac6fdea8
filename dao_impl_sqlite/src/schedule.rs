use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use dao::schedule::{ScheduleDao, ScheduleEntity, ScheduleTimeBlockEntity};
use dao::DaoError;
use sqlx::{query, query_as, FromRow};
use time::format_description::well_known::Iso8601;
use time::macros::format_description;
use time::{PrimitiveDateTime, Time};
use uuid::Uuid;

use crate::{ResultDbErrorExt, TransactionImpl};

#[derive(FromRow)]
struct ScheduleDb {
    id: Vec<u8>,
    created: String,
    update_version: Vec<u8>,
}

impl TryFrom<&ScheduleDb> for ScheduleEntity {
    type Error = DaoError;

    fn try_from(schedule: &ScheduleDb) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::from_slice(&schedule.id)?,
            created: PrimitiveDateTime::parse(&schedule.created, &Iso8601::DATE_TIME)?,
            version: Uuid::from_slice(&schedule.update_version)?,
        })
    }
}

#[derive(FromRow)]
struct ScheduleTimeBlockDb {
    id: Vec<u8>,
    schedule_id: Vec<u8>,
    day_of_week: i64,
    start_time: String,
    end_time: String,
    capacity: i64,
    enabled: bool,
    update_version: Vec<u8>,
}

impl TryFrom<&ScheduleTimeBlockDb> for ScheduleTimeBlockEntity {
    type Error = DaoError;

    fn try_from(block: &ScheduleTimeBlockDb) -> Result<Self, Self::Error> {
        let time_format = format_description!("[hour]:[minute]:[second]");
        Ok(Self {
            id: Uuid::from_slice(&block.id)?,
            schedule_id: Uuid::from_slice(&block.schedule_id)?,
            day_of_week: u8::try_from(block.day_of_week)
                .ok()
                .and_then(DayOfWeek::from_number)
                .ok_or(DaoError::InvalidDayOfWeek(block.day_of_week))?,
            start: Time::parse(&block.start_time, &time_format)?,
            end: Time::parse(&block.end_time, &time_format)?,
            capacity: block.capacity as u32,
            enabled: block.enabled,
            version: Uuid::from_slice(&block.update_version)?,
        })
    }
}

pub struct ScheduleDaoImpl {
    pub _pool: Arc<sqlx::SqlitePool>,
}
impl ScheduleDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { _pool: pool }
    }
}

#[async_trait]
impl ScheduleDao for ScheduleDaoImpl {
    type Transaction = TransactionImpl;

    async fn create_schedule(
        &self,
        entity: &ScheduleEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let id = entity.id.as_bytes().to_vec();
        let created = entity.created.format(&Iso8601::DATE_TIME)?;
        let version = entity.version.as_bytes().to_vec();
        query(
            r"INSERT INTO schedule (id, created, update_version, update_process)
              VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(created)
        .bind(version)
        .bind(process)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn find_schedule(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ScheduleEntity>, DaoError> {
        let id = id.as_bytes().to_vec();
        Ok(query_as::<_, ScheduleDb>(
            r"SELECT id, created, update_version FROM schedule WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .as_ref()
        .map(ScheduleEntity::try_from)
        .transpose()?)
    }

    async fn delete_schedule(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError> {
        let id = id.as_bytes().to_vec();
        query(
            r"DELETE FROM booking WHERE schedule_time_block_id IN
              (SELECT id FROM schedule_time_block WHERE schedule_id = ?)",
        )
        .bind(&id)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        query(r"DELETE FROM schedule_time_block WHERE schedule_id = ?")
            .bind(&id)
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        query(r"DELETE FROM schedule WHERE id = ?")
            .bind(&id)
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        Ok(())
    }

    async fn create_block(
        &self,
        entity: &ScheduleTimeBlockEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let id = entity.id.as_bytes().to_vec();
        let schedule_id = entity.schedule_id.as_bytes().to_vec();
        let day_of_week = entity.day_of_week.to_number() as i64;
        let time_format = format_description!("[hour]:[minute]:[second]");
        let start_time = entity.start.format(&time_format)?;
        let end_time = entity.end.format(&time_format)?;
        let version = entity.version.as_bytes().to_vec();
        query(
            r"INSERT INTO schedule_time_block
              (id, schedule_id, day_of_week, start_time, end_time, capacity, enabled, update_version, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(schedule_id)
        .bind(day_of_week)
        .bind(start_time)
        .bind(end_time)
        .bind(entity.capacity as i64)
        .bind(entity.enabled)
        .bind(version)
        .bind(process)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn blocks_for_schedule(
        &self,
        schedule_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[ScheduleTimeBlockEntity]>, DaoError> {
        let schedule_id = schedule_id.as_bytes().to_vec();
        Ok(query_as::<_, ScheduleTimeBlockDb>(
            r"SELECT id, schedule_id, day_of_week, start_time, end_time, capacity, enabled, update_version
              FROM schedule_time_block
              WHERE schedule_id = ?
              ORDER BY day_of_week, start_time",
        )
        .bind(schedule_id)
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(ScheduleTimeBlockEntity::try_from)
        .collect::<Result<Arc<[ScheduleTimeBlockEntity]>, DaoError>>()?)
    }

    async fn find_block(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<ScheduleTimeBlockEntity>, DaoError> {
        let id = id.as_bytes().to_vec();
        Ok(query_as::<_, ScheduleTimeBlockDb>(
            r"SELECT id, schedule_id, day_of_week, start_time, end_time, capacity, enabled, update_version
              FROM schedule_time_block
              WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .as_ref()
        .map(ScheduleTimeBlockEntity::try_from)
        .transpose()?)
    }

    async fn update_block(
        &self,
        entity: &ScheduleTimeBlockEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let id = entity.id.as_bytes().to_vec();
        let version = entity.version.as_bytes().to_vec();
        query(
            r"UPDATE schedule_time_block
              SET capacity = ?, enabled = ?, update_version = ?, update_process = ?
              WHERE id = ?",
        )
        .bind(entity.capacity as i64)
        .bind(entity.enabled)
        .bind(version)
        .bind(process)
        .bind(id)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(())
    }
}
