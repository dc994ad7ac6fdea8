use std::sync::Arc;

use async_trait::async_trait;
use dao::booking::{BookingDao, BookingEntity, BookingResetFilter, OccupancyEntity};
use dao::DaoError;
use sqlx::{query, query_as, FromRow};
use time::format_description::well_known::Iso8601;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

use crate::{ResultDbErrorExt, TransactionImpl};

#[derive(FromRow)]
struct BookingDb {
    id: Vec<u8>,
    schedule_time_block_id: Vec<u8>,
    user_id: Vec<u8>,
    booking_date: String,
    created: String,
}

impl TryFrom<&BookingDb> for BookingEntity {
    type Error = DaoError;

    fn try_from(booking: &BookingDb) -> Result<Self, Self::Error> {
        let date_format = format_description!("[year]-[month]-[day]");
        Ok(Self {
            id: Uuid::from_slice(&booking.id)?,
            schedule_time_block_id: Uuid::from_slice(&booking.schedule_time_block_id)?,
            user_id: Uuid::from_slice(&booking.user_id)?,
            booking_date: Date::parse(&booking.booking_date, &date_format)?,
            created: PrimitiveDateTime::parse(&booking.created, &Iso8601::DATE_TIME)?,
        })
    }
}

#[derive(FromRow)]
struct OccupancyDb {
    schedule_time_block_id: Vec<u8>,
    booking_date: String,
    booked: i64,
}

impl TryFrom<&OccupancyDb> for OccupancyEntity {
    type Error = DaoError;

    fn try_from(occupancy: &OccupancyDb) -> Result<Self, Self::Error> {
        let date_format = format_description!("[year]-[month]-[day]");
        Ok(Self {
            schedule_time_block_id: Uuid::from_slice(&occupancy.schedule_time_block_id)?,
            booking_date: Date::parse(&occupancy.booking_date, &date_format)?,
            booked: occupancy.booked as u32,
        })
    }
}

pub struct BookingDaoImpl {
    pub _pool: Arc<sqlx::SqlitePool>,
}
impl BookingDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { _pool: pool }
    }
}

#[async_trait]
impl BookingDao for BookingDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<BookingEntity>, DaoError> {
        let id = id.as_bytes().to_vec();
        Ok(query_as::<_, BookingDb>(
            r"SELECT id, schedule_time_block_id, user_id, booking_date, created
              FROM booking
              WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .as_ref()
        .map(BookingEntity::try_from)
        .transpose()?)
    }

    async fn find_by_occurrence_and_user(
        &self,
        schedule_time_block_id: Uuid,
        booking_date: Date,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<BookingEntity>, DaoError> {
        let date_format = format_description!("[year]-[month]-[day]");
        let block_id = schedule_time_block_id.as_bytes().to_vec();
        let booking_date = booking_date.format(&date_format)?;
        let user_id = user_id.as_bytes().to_vec();
        Ok(query_as::<_, BookingDb>(
            r"SELECT id, schedule_time_block_id, user_id, booking_date, created
              FROM booking
              WHERE schedule_time_block_id = ? AND booking_date = ? AND user_id = ?",
        )
        .bind(block_id)
        .bind(booking_date)
        .bind(user_id)
        .fetch_optional(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .as_ref()
        .map(BookingEntity::try_from)
        .transpose()?)
    }

    async fn occupancy_for_schedule(
        &self,
        schedule_id: Uuid,
        from: Date,
        until: Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OccupancyEntity]>, DaoError> {
        let date_format = format_description!("[year]-[month]-[day]");
        let schedule_id = schedule_id.as_bytes().to_vec();
        let from = from.format(&date_format)?;
        let until = until.format(&date_format)?;
        Ok(query_as::<_, OccupancyDb>(
            r"SELECT booking.schedule_time_block_id, booking.booking_date, count(*) as booked
              FROM booking
              INNER JOIN schedule_time_block ON schedule_time_block.id = booking.schedule_time_block_id
              WHERE schedule_time_block.schedule_id = ? AND booking.booking_date BETWEEN ? AND ?
              GROUP BY booking.schedule_time_block_id, booking.booking_date",
        )
        .bind(schedule_id)
        .bind(from)
        .bind(until)
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(OccupancyEntity::try_from)
        .collect::<Result<Arc<[OccupancyEntity]>, DaoError>>()?)
    }

    async fn find_for_user_in_window(
        &self,
        schedule_id: Uuid,
        user_id: Uuid,
        from: Date,
        until: Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[BookingEntity]>, DaoError> {
        let date_format = format_description!("[year]-[month]-[day]");
        let schedule_id = schedule_id.as_bytes().to_vec();
        let user_id = user_id.as_bytes().to_vec();
        let from = from.format(&date_format)?;
        let until = until.format(&date_format)?;
        Ok(query_as::<_, BookingDb>(
            r"SELECT booking.id, booking.schedule_time_block_id, booking.user_id, booking.booking_date, booking.created
              FROM booking
              INNER JOIN schedule_time_block ON schedule_time_block.id = booking.schedule_time_block_id
              WHERE schedule_time_block.schedule_id = ?
                AND booking.user_id = ?
                AND booking.booking_date BETWEEN ? AND ?",
        )
        .bind(schedule_id)
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?
        .iter()
        .map(BookingEntity::try_from)
        .collect::<Result<Arc<[BookingEntity]>, DaoError>>()?)
    }

    async fn create_within_capacity(
        &self,
        entity: &BookingEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<bool, DaoError> {
        let date_format = format_description!("[year]-[month]-[day]");
        let id = entity.id.as_bytes().to_vec();
        let block_id = entity.schedule_time_block_id.as_bytes().to_vec();
        let user_id = entity.user_id.as_bytes().to_vec();
        let booking_date = entity.booking_date.format(&date_format)?;
        let created = entity.created.format(&Iso8601::DATE_TIME)?;
        // Count check and insert are a single statement. Two writers racing
        // for the last seat serialize on the row write, the loser inserts
        // nothing and sees zero affected rows.
        let result = query(
            r"INSERT INTO booking (id, schedule_time_block_id, user_id, booking_date, created, update_process)
              SELECT ?, ?, ?, ?, ?, ?
              WHERE (SELECT count(*) FROM booking
                     WHERE schedule_time_block_id = ? AND booking_date = ?)
                  < (SELECT capacity FROM schedule_time_block WHERE id = ?)",
        )
        .bind(id)
        .bind(&block_id)
        .bind(user_id)
        .bind(&booking_date)
        .bind(created)
        .bind(process)
        .bind(&block_id)
        .bind(&booking_date)
        .bind(&block_id)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, tx: Self::Transaction) -> Result<(), DaoError> {
        let id = id.as_bytes().to_vec();
        query(r"DELETE FROM booking WHERE id = ?")
            .bind(id)
            .execute(tx.tx.lock().await.as_mut())
            .await
            .map_db_error()?;
        Ok(())
    }

    async fn delete_for_schedule(
        &self,
        schedule_id: Uuid,
        filter: BookingResetFilter,
        tx: Self::Transaction,
    ) -> Result<u64, DaoError> {
        let schedule_id = schedule_id.as_bytes().to_vec();
        let day_of_week = filter.day_of_week.map(|day| day.to_number() as i64);
        let block_id = filter
            .schedule_time_block_id
            .map(|id| id.as_bytes().to_vec());
        let result = query(
            r"DELETE FROM booking WHERE schedule_time_block_id IN
              (SELECT id FROM schedule_time_block
               WHERE schedule_id = ?
                 AND (? IS NULL OR day_of_week = ?)
                 AND (? IS NULL OR id = ?))",
        )
        .bind(schedule_id)
        .bind(day_of_week)
        .bind(day_of_week)
        .bind(&block_id)
        .bind(&block_id)
        .execute(tx.tx.lock().await.as_mut())
        .await
        .map_db_error()?;
        Ok(result.rows_affected())
    }
}
