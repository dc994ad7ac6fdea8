use service::clock::ClockService;

pub struct ClockServiceImpl;

impl ClockService for ClockServiceImpl {
    fn time_now(&self) -> time::Time {
        time::OffsetDateTime::now_utc().time()
    }

    fn date_now(&self) -> time::Date {
        time::OffsetDateTime::now_utc().date()
    }

    fn date_time_now(&self) -> time::PrimitiveDateTime {
        let now = time::OffsetDateTime::now_utc();
        time::PrimitiveDateTime::new(now.date(), now.time())
    }
}
