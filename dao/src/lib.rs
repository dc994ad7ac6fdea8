use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub mod booking;
pub mod schedule;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid day of week: {0}")]
    InvalidDayOfWeek(i64),

    #[error("Invalid uuid value: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Cannot parse time value: {0}")]
    TimeParseError(#[from] time::error::Parse),

    #[error("Cannot format time value: {0}")]
    TimeFormatError(#[from] time::error::Format),
}

/// Marker for a storage transaction handle. Implementations are cheap
/// clonable handles to one underlying transaction; dropping every handle
/// without a commit rolls the transaction back.
pub trait Transaction: Clone + Send + Sync + Debug + 'static {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockTransaction;
impl Transaction for MockTransaction {}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait TransactionDao {
    type Transaction: Transaction;

    async fn new_transaction(&self) -> Result<Self::Transaction, DaoError>;

    /// Reuse the given transaction or open a fresh one when the caller did
    /// not supply any.
    async fn use_transaction(
        &self,
        tx: Option<Self::Transaction>,
    ) -> Result<Self::Transaction, DaoError>;

    async fn commit(&self, tx: Self::Transaction) -> Result<(), DaoError>;
}

#[automock]
#[async_trait]
pub trait PermissionDao {
    async fn has_privilege(&self, user: &str, privilege: &str) -> Result<bool, DaoError>;
    async fn grant_privilege(
        &self,
        user: &str,
        privilege: &str,
        process: &str,
    ) -> Result<(), DaoError>;
}
