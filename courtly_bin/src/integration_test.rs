use std::sync::Arc;

use courtly_utils::DayOfWeek;
use dao::PermissionDao as _;
use service::availability::{AvailabilityService, SlotState};
use service::booking::{BookingRequest, BookingService, ResetFilter};
use service::permission::{Authentication, ADMIN_PRIVILEGE};
use service::schedule::{Schedule, ScheduleBlockDraft, ScheduleDraft, ScheduleService};
use service::ServiceError;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use time::macros::{date, time};
use time::{Date, Time};
use uuid::{uuid, Uuid};

use crate::Engine;

fn user_a() -> Uuid {
    uuid!("04215DFE-13C4-413C-8C66-77AC741BB5F0")
}
fn user_b() -> Uuid {
    uuid!("04215DFE-13C4-413C-8C66-77AC741BB5F1")
}
fn user_c() -> Uuid {
    uuid!("04215DFE-13C4-413C-8C66-77AC741BB5F2")
}

fn auth() -> Authentication<()> {
    Authentication::Context(())
}

fn monday() -> Date {
    date!(2026 - 08 - 24)
}

pub struct TestSetup {
    pub engine: Engine,
    pub pool: Arc<SqlitePool>,
}

/// One connection only, so concurrent tasks serialize on the pool and the
/// in-memory database behaves deterministically.
async fn setup() -> TestSetup {
    let pool = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Expected in-memory database"),
    );
    dao_impl_sqlite::schema::init_schema(pool.as_ref())
        .await
        .expect("Expected schema initialization to succeed");
    let engine = Engine::new(pool.clone());
    engine
        .permission_dao
        .grant_privilege("dev-user", ADMIN_PRIVILEGE, "test-setup")
        .await
        .expect("Expected privilege grant to succeed");
    TestSetup { engine, pool }
}

fn block_draft(day_of_week: DayOfWeek, start: Time, end: Time, capacity: u32) -> ScheduleBlockDraft {
    ScheduleBlockDraft {
        day_of_week,
        start,
        end,
        capacity,
        enabled: true,
    }
}

async fn create_default_schedule(setup: &TestSetup) -> Schedule {
    let draft = ScheduleDraft {
        blocks: vec![
            block_draft(DayOfWeek::Monday, time!(8:15), time!(8:50), 2),
            block_draft(DayOfWeek::Monday, time!(9:00), time!(9:35), 1),
            block_draft(DayOfWeek::Tuesday, time!(8:15), time!(8:50), 1),
        ],
    };
    setup
        .engine
        .schedule_service
        .create_schedule(&draft, auth(), None)
        .await
        .expect("Expected schedule creation to succeed")
}

async fn booking_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM booking")
        .fetch_one(pool)
        .await
        .expect("Expected booking count query to succeed")
}

async fn reserve_one(
    setup: &TestSetup,
    block_id: Uuid,
    booking_date: Date,
    user_id: Uuid,
) -> Result<Uuid, ServiceError> {
    let request = BookingRequest {
        schedule_time_block_id: block_id,
        booking_date,
    };
    let bookings = setup
        .engine
        .booking_service
        .reserve_many(&[request], user_id, auth(), None)
        .await?;
    Ok(bookings[0].id)
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    let block_id = schedule.blocks[0].id;

    reserve_one(&setup, block_id, monday(), user_a())
        .await
        .expect("Expected first reservation to succeed");
    let booking_a = reserve_one(&setup, block_id, monday(), user_a()).await;
    assert!(matches!(
        booking_a,
        Err(ServiceError::DuplicateBooking(_, _))
    ));
    reserve_one(&setup, block_id, monday(), user_b())
        .await
        .expect("Expected second reservation to succeed");

    // Block is at capacity now.
    let result = reserve_one(&setup, block_id, monday(), user_c()).await;
    assert!(matches!(result, Err(ServiceError::CapacityExceeded(_, _))));

    let week = setup
        .engine
        .availability_service
        .get_week(schedule.id, user_c(), monday(), auth(), None)
        .await
        .expect("Expected availability week");
    let cell = &week.rows[0].cells[0];
    assert_eq!(cell.state, SlotState::Full);
    assert_eq!(cell.booked_count, 2);

    // Cancelling frees one seat for everyone else.
    let booking_a = setup
        .engine
        .booking_service
        .reserve_many(
            &[BookingRequest {
                schedule_time_block_id: schedule.blocks[1].id,
                booking_date: monday(),
            }],
            user_a(),
            auth(),
            None,
        )
        .await
        .expect("Expected reservation on the second block")[0]
        .id;
    setup
        .engine
        .booking_service
        .cancel(booking_a, user_a(), auth(), None)
        .await
        .expect("Expected cancellation to succeed");
    let result = setup
        .engine
        .booking_service
        .cancel(booking_a, user_a(), auth(), None)
        .await;
    assert!(matches!(result, Err(ServiceError::BookingNotFound(_))));

    let week = setup
        .engine
        .availability_service
        .get_week(schedule.id, user_a(), monday(), auth(), None)
        .await
        .expect("Expected availability week");
    // Row 0 still booked by user A, row 1 free again.
    assert_eq!(week.rows[0].cells[0].state, SlotState::Booked);
    assert_eq!(week.rows[1].cells[0].state, SlotState::Available);
    assert_eq!(week.rows[1].cells[0].booked_count, 0);
}

#[tokio::test]
async fn test_concurrent_reservations_never_exceed_capacity() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    let block_id = schedule.blocks[0].id;
    let booking_service = setup.engine.booking_service.clone();

    let mut handles = Vec::new();
    for user_index in 0..6u128 {
        let booking_service = booking_service.clone();
        handles.push(tokio::spawn(async move {
            booking_service
                .reserve_many(
                    &[BookingRequest {
                        schedule_time_block_id: block_id,
                        booking_date: date!(2026 - 08 - 24),
                    }],
                    Uuid::from_u128(user_index + 1),
                    Authentication::Context(()),
                    None,
                )
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.expect("Expected task to finish") {
            Ok(_) => accepted += 1,
            Err(ServiceError::CapacityExceeded(_, _)) => {}
            Err(err) => panic!("Unexpected error: {}", err),
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(booking_count(setup.pool.as_ref()).await, 2);
}

#[tokio::test]
async fn test_failed_batch_persists_nothing() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    // Second request duplicates the first, the whole batch must roll back.
    let requests = [
        BookingRequest {
            schedule_time_block_id: schedule.blocks[0].id,
            booking_date: monday(),
        },
        BookingRequest {
            schedule_time_block_id: schedule.blocks[0].id,
            booking_date: monday(),
        },
    ];
    let result = setup
        .engine
        .booking_service
        .reserve_many(&requests, user_a(), auth(), None)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::DuplicateBooking(_, _))
    ));
    assert_eq!(booking_count(setup.pool.as_ref()).await, 0);
}

#[tokio::test]
async fn test_reserve_rejects_mismatched_date() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;

    // 2026-08-25 is a Tuesday, the first block recurs on Mondays.
    let result = reserve_one(&setup, schedule.blocks[0].id, date!(2026 - 08 - 25), user_a()).await;
    assert!(matches!(result, Err(ServiceError::DateDayMismatch { .. })));
    assert_eq!(booking_count(setup.pool.as_ref()).await, 0);
}

#[tokio::test]
async fn test_reserve_rejects_disabled_block() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;

    let draft = ScheduleDraft {
        blocks: vec![ScheduleBlockDraft {
            day_of_week: DayOfWeek::Monday,
            start: time!(8:15),
            end: time!(8:50),
            capacity: 2,
            enabled: false,
        }],
    };
    setup
        .engine
        .schedule_service
        .update_schedule(schedule.id, &draft, auth(), None)
        .await
        .expect("Expected update to succeed");

    let result = reserve_one(&setup, schedule.blocks[0].id, monday(), user_a()).await;
    assert!(matches!(result, Err(ServiceError::TimeBlockDisabled(_))));
}

#[tokio::test]
async fn test_update_keeps_bookings_and_skips_unknown_blocks() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    reserve_one(&setup, schedule.blocks[0].id, monday(), user_a())
        .await
        .expect("Expected reservation to succeed");

    let draft = ScheduleDraft {
        blocks: vec![
            // Disables the booked Monday block.
            ScheduleBlockDraft {
                day_of_week: DayOfWeek::Monday,
                start: time!(8:15),
                end: time!(8:50),
                capacity: 2,
                enabled: false,
            },
            // Never part of the schedule, must be skipped silently.
            block_draft(DayOfWeek::Friday, time!(12:00), time!(12:35), 3),
        ],
    };
    let update = setup
        .engine
        .schedule_service
        .update_schedule(schedule.id, &draft, auth(), None)
        .await
        .expect("Expected update to succeed");
    assert_eq!(update.updated_count, 1);

    // The booking survives the edit, the cell renders disabled.
    assert_eq!(booking_count(setup.pool.as_ref()).await, 1);
    let week = setup
        .engine
        .availability_service
        .get_week(schedule.id, user_a(), monday(), auth(), None)
        .await
        .expect("Expected availability week");
    assert_eq!(week.rows[0].cells[0].state, SlotState::Disabled);
    assert_eq!(week.rows[0].cells[0].booked_count, 1);

    let updated = setup
        .engine
        .schedule_service
        .get_schedule(schedule.id, auth(), None)
        .await
        .expect("Expected schedule");
    assert_eq!(updated.blocks.len(), 3);
    assert!(!updated.blocks[0].enabled);
    assert_eq!(updated.blocks[0].capacity, 0);
}

#[tokio::test]
async fn test_reset_bookings_with_and_without_filter() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    reserve_one(&setup, schedule.blocks[0].id, monday(), user_a())
        .await
        .expect("Expected Monday reservation");
    reserve_one(&setup, schedule.blocks[1].id, monday(), user_b())
        .await
        .expect("Expected Monday reservation");
    reserve_one(&setup, schedule.blocks[2].id, date!(2026 - 08 - 25), user_a())
        .await
        .expect("Expected Tuesday reservation");

    let filter = ResetFilter {
        day_of_week: Some(DayOfWeek::Monday),
        time_block_id: None,
    };
    let deleted = setup
        .engine
        .booking_service
        .reset_bookings(schedule.id, &filter, Some("season break".into()), auth(), None)
        .await
        .expect("Expected filtered reset to succeed");
    assert_eq!(deleted, 2);
    assert_eq!(booking_count(setup.pool.as_ref()).await, 1);

    let deleted = setup
        .engine
        .booking_service
        .reset_bookings(schedule.id, &ResetFilter::default(), None, auth(), None)
        .await
        .expect("Expected unfiltered reset to succeed");
    assert_eq!(deleted, 1);
    assert_eq!(booking_count(setup.pool.as_ref()).await, 0);
}

#[tokio::test]
async fn test_invalid_draft_persists_nothing() {
    let setup = setup().await;
    let draft = ScheduleDraft {
        blocks: vec![block_draft(DayOfWeek::Monday, time!(8:00), time!(8:35), 2)],
    };
    let result = setup
        .engine
        .schedule_service
        .create_schedule(&draft, auth(), None)
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidTimeBlock(_, _))));

    let schedules: i64 = sqlx::query_scalar("SELECT count(*) FROM schedule")
        .fetch_one(setup.pool.as_ref())
        .await
        .expect("Expected schedule count query to succeed");
    assert_eq!(schedules, 0);
}

#[tokio::test]
async fn test_delete_schedule_cascades() {
    let setup = setup().await;
    let schedule = create_default_schedule(&setup).await;
    reserve_one(&setup, schedule.blocks[0].id, monday(), user_a())
        .await
        .expect("Expected reservation to succeed");

    setup
        .engine
        .schedule_service
        .delete_schedule(schedule.id, auth(), None)
        .await
        .expect("Expected deletion to succeed");

    assert_eq!(booking_count(setup.pool.as_ref()).await, 0);
    let blocks: i64 = sqlx::query_scalar("SELECT count(*) FROM schedule_time_block")
        .fetch_one(setup.pool.as_ref())
        .await
        .expect("Expected block count query to succeed");
    assert_eq!(blocks, 0);
    let result = setup
        .engine
        .schedule_service
        .get_schedule(schedule.id, auth(), None)
        .await;
    assert!(matches!(result, Err(ServiceError::ScheduleNotFound(_))));
}

mod projection_properties {
    use std::collections::{HashMap, HashSet};

    use proptest::prelude::*;
    use service::catalog::TimeBlockCatalog;
    use service::schedule::ScheduleTimeBlock;
    use service_impl::availability::project_week;
    use time::macros::date;
    use uuid::Uuid;

    use courtly_utils::DayOfWeek;

    fn arbitrary_blocks() -> impl Strategy<Value = Vec<ScheduleTimeBlock>> {
        let catalog = TimeBlockCatalog::standard();
        let entry_count = catalog.entries().len();
        proptest::collection::vec((0u8..7, 0..entry_count, 0u32..5, any::<bool>()), 0..12).prop_map(
            move |raw| {
                let mut seen = HashSet::new();
                raw.into_iter()
                    .enumerate()
                    .filter_map(|(index, (day, entry_index, capacity, enabled))| {
                        let entry = catalog.entries()[entry_index];
                        let day_of_week = DayOfWeek::from_number(day).unwrap();
                        // The template never holds two blocks of the same shape.
                        seen.insert((day_of_week, entry.start))
                            .then(|| ScheduleTimeBlock {
                                id: Uuid::from_u128(index as u128 + 1),
                                schedule_id: Uuid::from_u128(99),
                                day_of_week,
                                start: entry.start,
                                end: entry.end,
                                capacity,
                                enabled,
                                version: Uuid::from_u128(index as u128 + 1000),
                            })
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn week_shape_holds_for_any_template(blocks in arbitrary_blocks(), booked in 0u32..6) {
            let today = date!(2026 - 08 - 24);
            let mut booked_counts = HashMap::new();
            for block in &blocks {
                booked_counts.insert((block.id, today), booked);
            }
            let week = project_week(
                Uuid::from_u128(99),
                &blocks,
                &booked_counts,
                &HashSet::new(),
                today,
            );

            for row in &week.rows {
                prop_assert_eq!(row.cells.len(), 7);
                prop_assert!(row.start < row.end);
                for (offset, cell) in row.cells.iter().enumerate() {
                    prop_assert_eq!(cell.date, today + time::Duration::days(offset as i64));
                    if cell.block_id.is_none() {
                        prop_assert_eq!(cell.state, service::availability::SlotState::Disabled);
                    }
                }
            }
            for pair in week.rows.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
            }

            let rerun = project_week(
                Uuid::from_u128(99),
                &blocks,
                &booked_counts,
                &HashSet::new(),
                today,
            );
            prop_assert_eq!(week, rerun);
        }
    }
}
