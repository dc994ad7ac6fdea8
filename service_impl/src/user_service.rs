use std::sync::Arc;

use async_trait::async_trait;
use service::user_service::UserService;
use service::ServiceError;

/// Development identity: every request resolves to the same user. Real
/// deployments plug in the transport's session resolution instead.
pub struct UserServiceDev;

pub const DEV_USER: &str = "dev-user";

#[async_trait]
impl UserService for UserServiceDev {
    type Context = ();

    async fn current_user(&self, _context: ()) -> Result<Arc<str>, ServiceError> {
        Ok(DEV_USER.into())
    }
}
