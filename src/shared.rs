/// Thread-safe handle to a scheduler.
///
/// Mutations take the write lock, snapshots take the read lock, so readers
/// never observe a half-applied operation.

use crate::error::Result;
use crate::models::{Appointment, AppointmentRequest, UrgencyLevel};
use crate::scheduler::{LevelCounts, Scheduler};
use chrono::{NaiveDate, NaiveTime};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct SharedScheduler {
    inner: Arc<RwLock<Scheduler>>,
}

impl SharedScheduler {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scheduler)),
        }
    }

    // Every operation leaves the scheduler consistent before it can panic,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Scheduler> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Scheduler> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue_request(&self, request: AppointmentRequest) -> Result<String> {
        self.write().enqueue_request(request)
    }

    pub fn serve_next(&self) -> Option<Appointment> {
        self.write().serve_next()
    }

    pub fn complete(&self, appointment_id: &str) -> Result<Appointment> {
        self.write().complete(appointment_id)
    }

    pub fn reschedule(
        &self,
        appointment_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        level: Option<UrgencyLevel>,
    ) -> Result<Appointment> {
        self.write().reschedule(appointment_id, date, time, level)
    }

    pub fn list_pending(&self) -> Vec<Appointment> {
        self.read().list_pending()
    }

    pub fn list_pending_where<P>(&self, predicate: P) -> Vec<Appointment>
    where
        P: Fn(&Appointment) -> bool,
    {
        self.read().list_pending_where(predicate)
    }

    pub fn pending_count(&self) -> usize {
        self.read().pending_count()
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.read().level_counts()
    }

    /// Run a closure against a consistent read-only view.
    pub fn with_read<T>(&self, f: impl FnOnce(&Scheduler) -> T) -> T {
        f(&self.read())
    }

    /// Run several mutations as one atomic step.
    pub fn with_write<T>(&self, f: impl FnOnce(&mut Scheduler) -> T) -> T {
        f(&mut self.write())
    }
}
