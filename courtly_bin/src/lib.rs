#[cfg(test)]
mod integration_test;

use std::sync::Arc;

use dao::PermissionDao as _;
use dao_impl_sqlite::booking::BookingDaoImpl;
use dao_impl_sqlite::schedule::ScheduleDaoImpl;
use dao_impl_sqlite::{PermissionDaoImpl, TransactionDaoImpl, TransactionImpl};
use service::catalog::TimeBlockCatalog;
use service::permission::ADMIN_PRIVILEGE;
use service_impl::availability::AvailabilityServiceDeps;
use service_impl::booking::BookingServiceDeps;
use sqlx::SqlitePool;

type Context = ();
type Transaction = TransactionImpl;
type TransactionDao = TransactionDaoImpl;
type ScheduleDao = ScheduleDaoImpl;
type BookingDao = BookingDaoImpl;
type UserService = service_impl::UserServiceDev;
type ClockService = service_impl::clock::ClockServiceImpl;
type UuidService = service_impl::uuid_service::UuidServiceImpl;
type PermissionService = service_impl::PermissionServiceImpl<PermissionDaoImpl, UserService>;
type ScheduleService = service_impl::schedule::ScheduleServiceImpl<
    ScheduleDao,
    PermissionService,
    ClockService,
    UuidService,
    TransactionDao,
>;

pub struct BookingDependencies;
impl BookingServiceDeps for BookingDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type ScheduleDao = ScheduleDao;
    type BookingDao = BookingDao;
    type PermissionService = PermissionService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type TransactionDao = TransactionDao;
}
type BookingService = service_impl::booking::BookingServiceImpl<BookingDependencies>;

pub struct AvailabilityDependencies;
impl AvailabilityServiceDeps for AvailabilityDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type ScheduleDao = ScheduleDao;
    type BookingDao = BookingDao;
    type TransactionDao = TransactionDao;
}
type AvailabilityService =
    service_impl::availability::AvailabilityServiceImpl<AvailabilityDependencies>;

/// Fully wired scheduling engine over one sqlite pool. The binary and the
/// integration tests share this wiring.
pub struct Engine {
    pub permission_dao: Arc<PermissionDaoImpl>,
    pub schedule_service: Arc<ScheduleService>,
    pub booking_service: Arc<BookingService>,
    pub availability_service: Arc<AvailabilityService>,
}

impl Engine {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        let transaction_dao = Arc::new(TransactionDao::new(pool.clone()));
        let permission_dao = Arc::new(PermissionDaoImpl::new(pool.clone()));
        let schedule_dao = Arc::new(ScheduleDao::new(pool.clone()));
        let booking_dao = Arc::new(BookingDao::new(pool.clone()));

        let user_service = Arc::new(service_impl::UserServiceDev);
        let permission_service = Arc::new(service_impl::PermissionServiceImpl::new(
            permission_dao.clone(),
            user_service,
        ));
        let clock_service = Arc::new(service_impl::clock::ClockServiceImpl);
        let uuid_service = Arc::new(service_impl::uuid_service::UuidServiceImpl);

        let schedule_service = Arc::new(service_impl::schedule::ScheduleServiceImpl::new(
            schedule_dao.clone(),
            permission_service.clone(),
            clock_service.clone(),
            uuid_service.clone(),
            transaction_dao.clone(),
            TimeBlockCatalog::standard(),
        ));
        let booking_service = Arc::new(service_impl::booking::BookingServiceImpl {
            schedule_dao: schedule_dao.clone(),
            booking_dao: booking_dao.clone(),
            permission_service: permission_service.clone(),
            clock_service: clock_service.clone(),
            uuid_service: uuid_service.clone(),
            transaction_dao: transaction_dao.clone(),
        });
        let availability_service = Arc::new(service_impl::availability::AvailabilityServiceImpl {
            schedule_dao,
            booking_dao,
            transaction_dao,
        });

        Self {
            permission_dao,
            schedule_service,
            booking_service,
            availability_service,
        }
    }
}

pub async fn grant_admin(permission_dao: &PermissionDaoImpl, username: &str) {
    permission_dao
        .grant_privilege(username, ADMIN_PRIVILEGE, "startup")
        .await
        .unwrap_or_else(|err| panic!("Expected being able to make {} an admin: {}", username, err));
}
