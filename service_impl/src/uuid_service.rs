use service::uuid_service::UuidService;
use uuid::Uuid;

pub struct UuidServiceImpl;

impl UuidService for UuidServiceImpl {
    fn new_uuid(&self, usage: &str) -> Uuid {
        let uuid = Uuid::new_v4();
        tracing::trace!(usage, %uuid, "minted uuid");
        uuid
    }
}
