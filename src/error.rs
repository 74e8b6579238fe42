/// Error types for the appointment scheduler.
///
/// Every variant is recoverable. Callers decide whether to surface them to a
/// user or treat them as signals (`NotPending` on a repeated completion).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invalid urgency level: '{0}'. Must be one of: critical, emergency, accident, normal")]
    InvalidLevel(String),

    #[error("Appointment {0} is not pending")]
    NotFound(String),

    #[error("Appointment {0} is not pending and cannot be completed")]
    NotPending(String),

    #[error("Invalid appointment request: {0}")]
    InvalidRequest(String),

    #[error("Appointment {0} is already queued")]
    DuplicateId(String),

    #[error("Appointment {0} was completed and cannot be queued again")]
    AlreadyCompleted(String),

    #[error("Pending queue is full ({0} appointments)")]
    QueueFull(usize),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
