pub mod calculations;
pub mod calendar;
pub mod config;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod interval;
pub mod item;
pub mod persistence;
pub mod record;
pub mod schedule;
pub mod validation;

pub use calendar::StudyCalendar;
pub use config::{PlannerConfig, StoreBackend};
pub use error::{RangeViolation, ScheduleError, ScheduleResult};
pub use interval::DateRange;
pub use item::{ItemId, ItemKind, Placement, PlanItem, WorkItem};
pub use persistence::{
    JsonDocumentStore, PersistenceError, PersistenceResult, ScheduleStore, load_schedule_from_csv,
    load_schedule_from_json, plan_from_records, save_schedule_to_csv, save_schedule_to_json,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use record::{ItemRecord, ItemRow};
pub use schedule::{Schedule, ScheduleSummary};
pub use validation::MAX_STUDY_DAYS;
