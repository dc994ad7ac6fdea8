use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use courtly_utils::{booking_window, DayOfWeek};
use dao::booking::BookingDao;
use dao::schedule::ScheduleDao;
use dao::TransactionDao;
use service::availability::{
    AvailabilityCell, AvailabilityRow, AvailabilityService, AvailabilityWeek, SlotState,
};
use service::permission::Authentication;
use service::schedule::ScheduleTimeBlock;
use service::ServiceError;
use time::Date;
use uuid::Uuid;

use crate::gen_service_impl;

gen_service_impl! {
    struct AvailabilityServiceImpl: service::availability::AvailabilityService = AvailabilityServiceDeps {
        ScheduleDao: dao::schedule::ScheduleDao<Transaction = Self::Transaction> = schedule_dao,
        BookingDao: dao::booking::BookingDao<Transaction = Self::Transaction> = booking_dao,
        TransactionDao: dao::TransactionDao<Transaction = Self::Transaction> = transaction_dao
    }
}

/// Projects one rolling week. Pure: every cell follows from the arguments
/// alone, so identical template and booking state always render the same
/// grid.
///
/// Cell state precedence is disabled, then booked by the requesting user,
/// then full, then available.
pub fn project_week(
    schedule_id: Uuid,
    blocks: &[ScheduleTimeBlock],
    booked_counts: &HashMap<(Uuid, Date), u32>,
    own_occurrences: &HashSet<(Uuid, Date)>,
    today: Date,
) -> AvailabilityWeek {
    let dates = booking_window(today);

    let mut row_shapes: Vec<(time::Time, time::Time)> = blocks
        .iter()
        .map(|block| (block.start, block.end))
        .collect();
    row_shapes.sort();
    row_shapes.dedup();

    let mut rows = Vec::with_capacity(row_shapes.len());
    for (start, end) in row_shapes {
        let mut cells = Vec::with_capacity(dates.len());
        for date in dates {
            let day_of_week = DayOfWeek::of(date);
            let block = blocks.iter().find(|block| {
                block.day_of_week == day_of_week && block.start == start && block.end == end
            });
            let cell = match block {
                None => AvailabilityCell {
                    date,
                    state: SlotState::Disabled,
                    block_id: None,
                    booked_count: 0,
                    capacity: 0,
                },
                Some(block) => {
                    let booked_count = booked_counts
                        .get(&(block.id, date))
                        .copied()
                        .unwrap_or(0);
                    let state = if !block.enabled {
                        SlotState::Disabled
                    } else if own_occurrences.contains(&(block.id, date)) {
                        SlotState::Booked
                    } else if booked_count >= block.effective_capacity() {
                        SlotState::Full
                    } else {
                        SlotState::Available
                    };
                    AvailabilityCell {
                        date,
                        state,
                        block_id: Some(block.id),
                        booked_count,
                        capacity: block.effective_capacity(),
                    }
                }
            };
            cells.push(cell);
        }
        rows.push(AvailabilityRow { start, end, cells });
    }

    AvailabilityWeek {
        schedule_id,
        from: today,
        rows,
    }
}

#[async_trait]
impl<Deps: AvailabilityServiceDeps> AvailabilityService for AvailabilityServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn get_week(
        &self,
        schedule_id: Uuid,
        user_id: Uuid,
        today: Date,
        _context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<AvailabilityWeek, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;

        self.schedule_dao
            .find_schedule(schedule_id, tx.clone())
            .await?
            .ok_or(ServiceError::ScheduleNotFound(schedule_id))?;
        let blocks: Vec<ScheduleTimeBlock> = self
            .schedule_dao
            .blocks_for_schedule(schedule_id, tx.clone())
            .await?
            .iter()
            .map(ScheduleTimeBlock::from)
            .collect();

        let until = booking_window(today)[6];
        let booked_counts: HashMap<(Uuid, Date), u32> = self
            .booking_dao
            .occupancy_for_schedule(schedule_id, today, until, tx.clone())
            .await?
            .iter()
            .map(|occupancy| {
                (
                    (occupancy.schedule_time_block_id, occupancy.booking_date),
                    occupancy.booked,
                )
            })
            .collect();
        let own_occurrences: HashSet<(Uuid, Date)> = self
            .booking_dao
            .find_for_user_in_window(schedule_id, user_id, today, until, tx.clone())
            .await?
            .iter()
            .map(|booking| (booking.schedule_time_block_id, booking.booking_date))
            .collect();

        self.transaction_dao.commit(tx).await?;

        Ok(project_week(
            schedule_id,
            &blocks,
            &booked_counts,
            &own_occurrences,
            today,
        ))
    }
}
