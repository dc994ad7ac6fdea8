use std::collections::{HashMap, HashSet};

use courtly_utils::DayOfWeek;
use dao::booking::{MockBookingDao, OccupancyEntity};
use dao::schedule::MockScheduleDao;
use dao::{MockTransaction, MockTransactionDao};
use mockall::predicate::{always, eq};
use service::availability::{AvailabilityService, SlotState};
use service::schedule::ScheduleTimeBlock;
use time::macros::{date, time};
use time::Date;
use uuid::Uuid;

use crate::availability::{project_week, AvailabilityServiceDeps, AvailabilityServiceImpl};
use crate::test::booking::{default_booking_entity, default_user_id};
use crate::test::error_test::*;
use crate::test::schedule::{
    alternate_block_id, default_block_entity, default_block_id, default_schedule_entity,
    default_schedule_id,
};

fn default_block() -> ScheduleTimeBlock {
    ScheduleTimeBlock::from(&default_block_entity())
}

fn monday() -> Date {
    date!(2026 - 08 - 24)
}

#[test]
fn test_project_week_has_seven_columns_per_row() {
    let blocks = [default_block()];
    let week = project_week(
        default_schedule_id(),
        &blocks,
        &HashMap::new(),
        &HashSet::new(),
        monday(),
    );

    assert_eq!(week.from, monday());
    assert_eq!(week.rows.len(), 1);
    assert_eq!(week.rows[0].cells.len(), 7);
    let dates: Vec<Date> = week.rows[0].cells.iter().map(|cell| cell.date).collect();
    assert_eq!(dates[0], monday());
    assert_eq!(dates[6], date!(2026 - 08 - 30));
}

#[test]
fn test_project_week_rows_sorted_by_start_time() {
    let blocks = [
        ScheduleTimeBlock {
            id: alternate_block_id(),
            start: time!(21:45),
            end: time!(22:20),
            ..default_block()
        },
        default_block(),
    ];
    let week = project_week(
        default_schedule_id(),
        &blocks,
        &HashMap::new(),
        &HashSet::new(),
        monday(),
    );

    assert_eq!(week.rows.len(), 2);
    assert!(week.rows[0].start < week.rows[1].start);
    assert_eq!(week.rows[0].start, time!(8:15));
}

#[test]
fn test_project_week_cell_states() {
    // Monday block with capacity 2, full; Tuesday block held by the user;
    // Wednesday block open; the other days carry no block at all.
    let blocks = [
        default_block(),
        ScheduleTimeBlock {
            id: alternate_block_id(),
            day_of_week: DayOfWeek::Tuesday,
            ..default_block()
        },
        ScheduleTimeBlock {
            id: Uuid::from_u128(3),
            day_of_week: DayOfWeek::Wednesday,
            ..default_block()
        },
    ];
    let mut booked_counts = HashMap::new();
    booked_counts.insert((default_block_id(), monday()), 2);
    booked_counts.insert((alternate_block_id(), date!(2026 - 08 - 25)), 1);
    let mut own_occurrences = HashSet::new();
    own_occurrences.insert((alternate_block_id(), date!(2026 - 08 - 25)));

    let week = project_week(
        default_schedule_id(),
        &blocks,
        &booked_counts,
        &own_occurrences,
        monday(),
    );

    let cells = &week.rows[0].cells;
    assert_eq!(cells[0].state, SlotState::Full);
    assert_eq!(cells[0].booked_count, 2);
    assert_eq!(cells[1].state, SlotState::Booked);
    assert_eq!(cells[2].state, SlotState::Available);
    assert_eq!(cells[2].booked_count, 0);
    assert_eq!(cells[3].state, SlotState::Disabled);
    assert_eq!(cells[3].block_id, None);
}

#[test]
fn test_project_week_disabled_beats_own_booking() {
    // A block disabled after the user booked it still renders disabled,
    // with its stored capacity masked to zero.
    let blocks = [ScheduleTimeBlock {
        enabled: false,
        capacity: 5,
        ..default_block()
    }];
    let mut own_occurrences = HashSet::new();
    own_occurrences.insert((default_block_id(), monday()));
    let mut booked_counts = HashMap::new();
    booked_counts.insert((default_block_id(), monday()), 1);

    let week = project_week(
        default_schedule_id(),
        &blocks,
        &booked_counts,
        &own_occurrences,
        monday(),
    );

    let cell = &week.rows[0].cells[0];
    assert_eq!(cell.state, SlotState::Disabled);
    assert_eq!(cell.block_id, Some(default_block_id()));
    assert_eq!(cell.capacity, 0);
    assert_eq!(cell.booked_count, 1);
}

#[test]
fn test_project_week_is_deterministic() {
    let blocks = [default_block()];
    let mut booked_counts = HashMap::new();
    booked_counts.insert((default_block_id(), monday()), 1);
    let own_occurrences = HashSet::new();

    let first = project_week(
        default_schedule_id(),
        &blocks,
        &booked_counts,
        &own_occurrences,
        monday(),
    );
    let second = project_week(
        default_schedule_id(),
        &blocks,
        &booked_counts,
        &own_occurrences,
        monday(),
    );
    assert_eq!(first, second);
}

pub struct AvailabilityServiceDependencies {
    pub schedule_dao: MockScheduleDao,
    pub booking_dao: MockBookingDao,
    pub transaction_dao: MockTransactionDao,
}
impl AvailabilityServiceDeps for AvailabilityServiceDependencies {
    type Context = ();
    type Transaction = MockTransaction;
    type ScheduleDao = MockScheduleDao;
    type BookingDao = MockBookingDao;
    type TransactionDao = MockTransactionDao;
}
impl AvailabilityServiceDependencies {
    pub fn build_service(self) -> AvailabilityServiceImpl<AvailabilityServiceDependencies> {
        AvailabilityServiceImpl {
            schedule_dao: self.schedule_dao.into(),
            booking_dao: self.booking_dao.into(),
            transaction_dao: self.transaction_dao.into(),
        }
    }
}

pub fn build_dependencies() -> AvailabilityServiceDependencies {
    let schedule_dao = MockScheduleDao::new();
    let booking_dao = MockBookingDao::new();
    let mut transaction_dao = MockTransactionDao::new();
    transaction_dao
        .expect_use_transaction()
        .returning(|_| Ok(MockTransaction));
    transaction_dao.expect_commit().returning(|_| Ok(()));

    AvailabilityServiceDependencies {
        schedule_dao,
        booking_dao,
        transaction_dao,
    }
}

#[tokio::test]
async fn test_get_week() {
    let mut deps = build_dependencies();
    deps.schedule_dao
        .expect_find_schedule()
        .with(eq(default_schedule_id()), always())
        .returning(|_, _| Ok(Some(default_schedule_entity())));
    deps.schedule_dao
        .expect_blocks_for_schedule()
        .returning(|_, _| Ok([default_block_entity()].into()));
    deps.booking_dao
        .expect_occupancy_for_schedule()
        .with(
            eq(default_schedule_id()),
            eq(monday()),
            eq(date!(2026 - 08 - 30)),
            always(),
        )
        .returning(|_, _, _, _| {
            Ok([OccupancyEntity {
                schedule_time_block_id: default_block_id(),
                booking_date: monday(),
                booked: 1,
            }]
            .into())
        });
    deps.booking_dao
        .expect_find_for_user_in_window()
        .returning(|_, _, _, _, _| Ok([default_booking_entity()].into()));
    let service = deps.build_service();

    let week = service
        .get_week(
            default_schedule_id(),
            default_user_id(),
            monday(),
            ().auth(),
            None,
        )
        .await
        .expect("Expected availability week");

    assert_eq!(week.schedule_id, default_schedule_id());
    assert_eq!(week.rows.len(), 1);
    // The user's own booking on Monday wins over the raw count.
    assert_eq!(week.rows[0].cells[0].state, SlotState::Booked);
    assert_eq!(week.rows[0].cells[0].booked_count, 1);
}

#[tokio::test]
async fn test_get_week_schedule_not_found() {
    let mut deps = build_dependencies();
    deps.schedule_dao
        .expect_find_schedule()
        .returning(|_, _| Ok(None));
    let service = deps.build_service();

    let result = service
        .get_week(
            default_schedule_id(),
            default_user_id(),
            monday(),
            ().auth(),
            None,
        )
        .await;
    test_schedule_not_found(&result, &default_schedule_id());
}
