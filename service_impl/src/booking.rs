use std::sync::Arc;

use async_trait::async_trait;
use courtly_utils::DayOfWeek;
use dao::booking::{BookingDao, BookingEntity, BookingResetFilter};
use dao::schedule::ScheduleDao;
use dao::TransactionDao;
use service::clock::ClockService;
use service::uuid_service::UuidService;
use service::PermissionService;
use service::booking::{Booking, BookingRequest, BookingService, ResetFilter};
use service::permission::{Authentication, ADMIN_PRIVILEGE};
use service::ServiceError;
use uuid::Uuid;

use crate::gen_service_impl;

const BOOKING_SERVICE_PROCESS: &str = "booking-service";

gen_service_impl! {
    struct BookingServiceImpl: service::booking::BookingService = BookingServiceDeps {
        ScheduleDao: dao::schedule::ScheduleDao<Transaction = Self::Transaction> = schedule_dao,
        BookingDao: dao::booking::BookingDao<Transaction = Self::Transaction> = booking_dao,
        PermissionService: service::PermissionService<Context = Self::Context> = permission_service,
        ClockService: service::clock::ClockService = clock_service,
        UuidService: service::uuid_service::UuidService = uuid_service,
        TransactionDao: dao::TransactionDao<Transaction = Self::Transaction> = transaction_dao
    }
}

#[async_trait]
impl<Deps: BookingServiceDeps> BookingService for BookingServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn reserve_many(
        &self,
        requests: &[BookingRequest],
        user_id: Uuid,
        _context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Booking]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;

        // Any rejected request returns early, which drops the transaction
        // uncommitted and rolls back every booking of the batch.
        let mut bookings = Vec::with_capacity(requests.len());
        for request in requests {
            let block = self
                .schedule_dao
                .find_block(request.schedule_time_block_id, tx.clone())
                .await?
                .ok_or(ServiceError::TimeBlockNotFound(
                    request.schedule_time_block_id,
                ))?;
            if !block.enabled {
                return Err(ServiceError::TimeBlockDisabled(block.id));
            }
            let got = DayOfWeek::of(request.booking_date);
            if got != block.day_of_week {
                return Err(ServiceError::DateDayMismatch {
                    date: request.booking_date,
                    expected: block.day_of_week,
                    got,
                });
            }
            if self
                .booking_dao
                .find_by_occurrence_and_user(block.id, request.booking_date, user_id, tx.clone())
                .await?
                .is_some()
            {
                return Err(ServiceError::DuplicateBooking(
                    block.id,
                    request.booking_date,
                ));
            }

            let entity = BookingEntity {
                id: self.uuid_service.new_uuid("booking-id"),
                schedule_time_block_id: block.id,
                user_id,
                booking_date: request.booking_date,
                created: self.clock_service.date_time_now(),
            };
            let inserted = self
                .booking_dao
                .create_within_capacity(&entity, BOOKING_SERVICE_PROCESS, tx.clone())
                .await?;
            if !inserted {
                return Err(ServiceError::CapacityExceeded(
                    block.id,
                    request.booking_date,
                ));
            }
            bookings.push(Booking::from(&entity));
        }

        self.transaction_dao.commit(tx).await?;
        tracing::info!(user = %user_id, bookings = bookings.len(), "reservation batch accepted");
        Ok(bookings.into())
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        _context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;

        let booking = self
            .booking_dao
            .find_by_id(booking_id, tx.clone())
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;
        // Foreign bookings read as absent so the response does not reveal
        // whether the id exists.
        if booking.user_id != user_id {
            return Err(ServiceError::BookingNotFound(booking_id));
        }
        self.booking_dao.delete(booking_id, tx.clone()).await?;

        self.transaction_dao.commit(tx).await?;
        tracing::info!(booking = %booking_id, user = %user_id, "booking cancelled");
        Ok(())
    }

    async fn reset_bookings(
        &self,
        schedule_id: Uuid,
        filter: &ResetFilter,
        reason: Option<Arc<str>>,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u64, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;

        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.schedule_dao
            .find_schedule(schedule_id, tx.clone())
            .await?
            .ok_or(ServiceError::ScheduleNotFound(schedule_id))?;
        if let Some(block_id) = filter.time_block_id {
            let block = self
                .schedule_dao
                .find_block(block_id, tx.clone())
                .await?
                .ok_or(ServiceError::TimeBlockNotFound(block_id))?;
            if block.schedule_id != schedule_id {
                return Err(ServiceError::TimeBlockNotFound(block_id));
            }
        }

        let deleted = self
            .booking_dao
            .delete_for_schedule(
                schedule_id,
                BookingResetFilter {
                    day_of_week: filter.day_of_week,
                    schedule_time_block_id: filter.time_block_id,
                },
                tx.clone(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        tracing::info!(
            schedule = %schedule_id,
            deleted,
            reason = reason.as_deref().unwrap_or("-"),
            "bookings reset"
        );
        Ok(deleted)
    }
}
