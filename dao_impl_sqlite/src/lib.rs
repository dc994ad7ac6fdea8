use std::sync::Arc;

use async_trait::async_trait;
use dao::{DaoError, Transaction};
use sqlx::{query, query_as, FromRow, SqlitePool};
use tokio::sync::Mutex;

pub mod booking;
pub mod schedule;
pub mod schema;

pub trait ResultDbErrorExt<T, E> {
    fn map_db_error(self) -> Result<T, DaoError>;
}
impl<T, E: std::error::Error + Send + Sync + 'static> ResultDbErrorExt<T, E> for Result<T, E> {
    fn map_db_error(self) -> Result<T, DaoError> {
        self.map_err(|err| DaoError::DatabaseQueryError(Box::new(err)))
    }
}

/// Shared handle to one open sqlite transaction. Dropping every clone
/// without a commit rolls the transaction back.
#[derive(Clone, Debug)]
pub struct TransactionImpl {
    tx: Arc<Mutex<sqlx::Transaction<'static, sqlx::Sqlite>>>,
}

impl Transaction for TransactionImpl {}

pub struct TransactionDaoImpl {
    pool: Arc<SqlitePool>,
}
impl TransactionDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}
#[async_trait]
impl dao::TransactionDao for TransactionDaoImpl {
    type Transaction = TransactionImpl;

    async fn new_transaction(&self) -> Result<Self::Transaction, DaoError> {
        let tx = self.pool.begin().await.map_db_error()?;
        Ok(TransactionImpl {
            tx: Arc::new(tx.into()),
        })
    }

    async fn use_transaction(
        &self,
        tx: Option<Self::Transaction>,
    ) -> Result<Self::Transaction, DaoError> {
        match tx {
            Some(tx) => Ok(tx),
            None => self.new_transaction().await,
        }
    }

    async fn commit(&self, transaction: Self::Transaction) -> Result<(), DaoError> {
        if let Some(tx) = Arc::into_inner(transaction.tx) {
            tx.into_inner().commit().await.map_db_error()?;
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct CountDb {
    results: i64,
}

pub struct PermissionDaoImpl {
    pool: Arc<SqlitePool>,
}
impl PermissionDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}
#[async_trait]
impl dao::PermissionDao for PermissionDaoImpl {
    async fn has_privilege(&self, user: &str, privilege: &str) -> Result<bool, DaoError> {
        let result = query_as::<_, CountDb>(
            r"SELECT count(*) as results FROM user_privilege
              WHERE user_name = ? AND privilege_name = ?",
        )
        .bind(user)
        .bind(privilege)
        .fetch_one(self.pool.as_ref())
        .await
        .map_db_error()?;
        Ok(result.results > 0)
    }

    async fn grant_privilege(
        &self,
        user: &str,
        privilege: &str,
        process: &str,
    ) -> Result<(), DaoError> {
        query(
            r"INSERT OR IGNORE INTO user_privilege (user_name, privilege_name, update_process)
              VALUES (?, ?, ?)",
        )
        .bind(user)
        .bind(privilege)
        .bind(process)
        .execute(self.pool.as_ref())
        .await
        .map_db_error()?;
        Ok(())
    }
}
