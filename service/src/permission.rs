use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// Privilege required for schedule administration and bulk booking resets.
pub const ADMIN_PRIVILEGE: &str = "facility.admin";

/// `Full` is used for internal service-to-service calls and skips every
/// check; `Context` carries the caller identity of the surrounding
/// transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication<Context: Clone + PartialEq + Eq + Send + Sync + Debug + 'static> {
    Full,
    Context(Context),
}
impl<Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static> From<Context>
    for Authentication<Context>
{
    fn from(context: Context) -> Self {
        Self::Context(context)
    }
}

#[automock(type Context=();)]
#[async_trait]
pub trait PermissionService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;

    async fn check_permission(
        &self,
        privilege: &str,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError>;
}
