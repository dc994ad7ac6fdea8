use sqlx::SqlitePool;

use crate::ResultDbErrorExt;
use dao::DaoError;

/// Creates the tables of the scheduling engine when they do not exist yet.
/// Runs at startup, so a fresh database file is usable immediately.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), DaoError> {
    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS schedule (
            id BLOB PRIMARY KEY NOT NULL,
            created TEXT NOT NULL,
            update_version BLOB NOT NULL,
            update_process TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_db_error()?;

    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS schedule_time_block (
            id BLOB PRIMARY KEY NOT NULL,
            schedule_id BLOB NOT NULL,
            day_of_week INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            enabled INTEGER NOT NULL,
            update_version BLOB NOT NULL,
            update_process TEXT NOT NULL,
            UNIQUE (schedule_id, day_of_week, start_time, end_time)
        )",
    )
    .execute(pool)
    .await
    .map_db_error()?;

    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS booking (
            id BLOB PRIMARY KEY NOT NULL,
            schedule_time_block_id BLOB NOT NULL,
            user_id BLOB NOT NULL,
            booking_date TEXT NOT NULL,
            created TEXT NOT NULL,
            update_process TEXT NOT NULL,
            UNIQUE (schedule_time_block_id, booking_date, user_id)
        )",
    )
    .execute(pool)
    .await
    .map_db_error()?;

    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS user_privilege (
            user_name TEXT NOT NULL,
            privilege_name TEXT NOT NULL,
            update_process TEXT NOT NULL,
            PRIMARY KEY (user_name, privilege_name)
        )",
    )
    .execute(pool)
    .await
    .map_db_error()?;

    Ok(())
}
