use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// Identity collaborator: resolves the transport context to the
/// authenticated user name. The engine trusts the result verbatim.
#[automock(type Context=();)]
#[async_trait]
pub trait UserService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;

    async fn current_user(&self, context: Self::Context) -> Result<Arc<str>, ServiceError>;
}
