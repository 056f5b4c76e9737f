//! Heartbeat scheduler (§4.3): cron-like periodic jobs with delivery
//! policies and idempotency.

mod cron;
mod dispatcher;
mod job;

pub use cron::{next_after, parse_schedule, JobSchedule};
pub use dispatcher::HeartbeatScheduler;
pub use job::{DeliveryPolicy, JobCommand, JobsConfig, ScheduledJob};
