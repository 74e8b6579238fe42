//! Patient appointment queue
//!
//! A four-level priority queue (critical, emergency, accident, normal) with a
//! greedy scheduler on top: the most urgent level is always served first and
//! ties are broken by arrival order. Storage and presentation are left to the
//! caller, which records the transitions the scheduler reports.

pub mod error;
pub mod logging;
pub mod models;
pub mod queue;
pub mod scheduler;
pub mod shared;

pub use error::{Result, SchedulerError};
pub use models::{
    create_appointment_request, Appointment, AppointmentRequest, AppointmentStatus, UrgencyLevel,
};
pub use queue::PriorityQueueSet;
pub use scheduler::{for_doctor, search, LevelCounts, Scheduler, SchedulerConfig};
pub use shared::SharedScheduler;
