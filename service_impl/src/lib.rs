pub mod availability;
pub mod booking;
pub mod clock;
pub mod macros;
pub mod permission;
pub mod schedule;
pub mod user_service;
pub mod uuid_service;

#[cfg(test)]
mod test;

pub use permission::PermissionServiceImpl;
pub use user_service::UserServiceDev;
