/// Greedy appointment scheduler built on the four-level queue set.
///
/// This module provides the Scheduler struct, which assigns arrival sequence
/// numbers, serves the most urgent pending appointment, and handles the
/// complete and reschedule transitions.

use crate::error::{Result, SchedulerError};
use crate::models::{Appointment, AppointmentRequest, AppointmentStatus, UrgencyLevel};
use crate::queue::PriorityQueueSet;
use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Configuration for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Arrival sequence number given to the first enqueued appointment
    pub first_sequence: u64,
    /// Upper bound on pending appointments, if any
    pub max_pending: Option<usize>,
    /// Default log filter for the binary
    pub log_level: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            first_sequence: 1,
            max_pending: None,
            log_level: "info".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Defaults overlaid with `CLINIC_QUEUE_MAX_PENDING` and `CLINIC_QUEUE_LOG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("CLINIC_QUEUE_MAX_PENDING") {
            match value.trim().parse::<usize>() {
                Ok(max) => config.max_pending = Some(max),
                Err(_) => warn!("Ignoring CLINIC_QUEUE_MAX_PENDING={:?}: not a number", value),
            }
        }
        if let Ok(value) = std::env::var("CLINIC_QUEUE_LOG") {
            if !value.trim().is_empty() {
                config.log_level = value.trim().to_string();
            }
        }

        config
    }
}

/// Pending counts per urgency level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub critical: usize,
    pub emergency: usize,
    pub accident: usize,
    pub normal: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.critical + self.emergency + self.accident + self.normal
    }
}

/// Matches appointments whose name, date, time or level contains `query`.
pub fn search(query: &str) -> impl Fn(&Appointment) -> bool + '_ {
    move |appointment| appointment.matches(query)
}

/// Matches appointments assigned to `doctor`, ignoring case.
pub fn for_doctor(doctor: &str) -> impl Fn(&Appointment) -> bool + '_ {
    move |appointment| {
        appointment
            .doctor
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(doctor.trim()))
    }
}

/// Greedy priority scheduler.
///
/// Always serves the highest urgency level first and, within a level, the
/// earliest arrival. Served appointments leave the queue but stay pending,
/// held in service until the caller completes or reschedules them.
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    queues: PriorityQueueSet,
    in_service: HashMap<String, Appointment>,
    next_sequence: u64,
    completed: HashSet<String>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    /// Initialize the scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Scheduler {
            next_sequence: config.first_sequence,
            config,
            queues: PriorityQueueSet::new(),
            in_service: HashMap::new(),
            completed: HashSet::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Build a scheduler and replay persisted pending records into it.
    ///
    /// `max_pending` only limits new registrations; every stored record is
    /// replayed even when there are more of them than the cap.
    pub fn rehydrate<I>(config: SchedulerConfig, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Appointment>,
    {
        let mut records: Vec<Appointment> = records.into_iter().collect();
        records.sort_by_key(Appointment::arrival);

        let mut scheduler = Scheduler::new(config);
        for record in records {
            scheduler.insert_record(record, false)?;
        }

        info!(
            "Rehydrated {} pending appointments, next sequence {}",
            scheduler.pending_count(),
            scheduler.next_sequence
        );
        Ok(scheduler)
    }

    fn check_capacity(&self) -> Result<()> {
        match self.config.max_pending {
            Some(max) if self.queues.len() >= max => {
                warn!("Rejecting appointment: pending queue is full ({})", max);
                Err(SchedulerError::QueueFull(max))
            }
            _ => Ok(()),
        }
    }

    /// Register a new appointment and return its identifier.
    pub fn enqueue_request(&mut self, request: AppointmentRequest) -> Result<String> {
        let appointment = Appointment::from_request(request);
        let id = appointment.appointment_id.clone();
        self.enqueue(appointment)?;
        Ok(id)
    }

    /// Queue a record under a fresh arrival sequence number.
    pub fn enqueue(&mut self, mut appointment: Appointment) -> Result<u64> {
        appointment.sequence = None;
        self.enqueue_record(appointment)
    }

    /// Queue a record, keeping its arrival sequence number if it has one.
    ///
    /// The counter always moves past the highest number seen so numbers are
    /// never handed out twice.
    pub fn enqueue_record(&mut self, appointment: Appointment) -> Result<u64> {
        self.insert_record(appointment, true)
    }

    fn insert_record(&mut self, mut appointment: Appointment, capped: bool) -> Result<u64> {
        let id = appointment.appointment_id.clone();
        if self.completed.contains(&id) {
            warn!("Rejecting {}: already completed", id);
            return Err(SchedulerError::AlreadyCompleted(id));
        }
        if self.queues.contains(&id) || self.in_service.contains_key(&id) {
            warn!("Rejecting {}: already queued", id);
            return Err(SchedulerError::DuplicateId(id));
        }
        if capped {
            self.check_capacity()?;
        }

        let sequence = match appointment.sequence {
            Some(sequence) => sequence,
            None => self.next_sequence,
        };
        // u64::MAX is reserved for unassigned records, see `Appointment::arrival`.
        let following = sequence.checked_add(1).ok_or_else(|| {
            warn!("Rejecting {}: arrival sequence {} out of range", id, sequence);
            SchedulerError::InvalidRequest(format!("arrival sequence {} out of range", sequence))
        })?;
        let replayed_early = following < self.next_sequence;
        self.next_sequence = self.next_sequence.max(following);

        appointment.sequence = Some(sequence);
        appointment.status = AppointmentStatus::Pending;

        info!(
            "Enqueued {} ({}) at {} with sequence {}",
            id, appointment.patient_name, appointment.level, sequence
        );

        let level = appointment.level;
        if replayed_early {
            // Replayed out of order: keep the level sorted by seniority.
            self.queues.insert_by_sequence(level, appointment);
        } else {
            self.queues.push(level, appointment);
        }
        Ok(sequence)
    }

    /// Remove and return the next appointment to be seen, or `None` when
    /// nothing is pending. The appointment stays `Pending` and in service
    /// until it is completed or rescheduled by id.
    pub fn serve_next(&mut self) -> Option<Appointment> {
        match self.queues.pop_highest() {
            Some(appointment) => {
                info!(
                    "Serving {} ({}, {})",
                    appointment.appointment_id, appointment.patient_name, appointment.level
                );
                self.in_service
                    .insert(appointment.appointment_id.clone(), appointment.clone());
                Some(appointment)
            }
            None => {
                debug!("Serve requested with no pending appointments");
                None
            }
        }
    }

    /// The appointment `serve_next` would return, without removing it.
    pub fn peek_next(&self) -> Option<&Appointment> {
        self.queues.peek_highest()
    }

    /// Mark an appointment completed.
    ///
    /// Works for queued and in-service appointments alike. Unknown and
    /// already-completed identifiers yield `NotPending`.
    pub fn complete(&mut self, appointment_id: &str) -> Result<Appointment> {
        if self.completed.contains(appointment_id) {
            debug!("Complete repeated for {}", appointment_id);
            return Err(SchedulerError::NotPending(appointment_id.to_string()));
        }

        let mut appointment = self
            .take_pending(appointment_id)
            .map_err(|_| SchedulerError::NotPending(appointment_id.to_string()))?;

        appointment.status = AppointmentStatus::Completed;
        self.completed.insert(appointment.appointment_id.clone());

        info!(
            "Completed {} ({})",
            appointment.appointment_id, appointment.patient_name
        );
        Ok(appointment)
    }

    /// Take a pending appointment out of its queue or out of service.
    fn take_pending(&mut self, appointment_id: &str) -> Result<Appointment> {
        match self.queues.remove(appointment_id) {
            Ok(appointment) => Ok(appointment),
            Err(e) => self.in_service.remove(appointment_id).ok_or(e),
        }
    }

    /// Move a pending appointment to a new date and time, optionally at a
    /// different urgency level.
    ///
    /// The arrival sequence number is kept. Without a level change the
    /// appointment returns to its seniority position; with one it joins the
    /// tail of the new level. An in-service appointment goes back into the
    /// queue the same way.
    pub fn reschedule(
        &mut self,
        appointment_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        level: Option<UrgencyLevel>,
    ) -> Result<Appointment> {
        let mut appointment = self.take_pending(appointment_id).map_err(|e| {
            warn!("Cannot reschedule {}: not pending", appointment_id);
            e
        })?;

        let old_level = appointment.level;
        appointment.date = date;
        appointment.time = time;

        match level {
            Some(new_level) if new_level != old_level => {
                appointment.level = new_level;
                self.queues.push(new_level, appointment.clone());
            }
            _ => self.queues.insert_by_sequence(old_level, appointment.clone()),
        }

        info!(
            "Rescheduled {} to {} {} at {} (was {})",
            appointment.appointment_id,
            appointment.date,
            appointment.time.format("%H:%M"),
            appointment.level,
            old_level
        );
        Ok(appointment)
    }

    /// Snapshot of pending appointments in serving order.
    pub fn list_pending(&self) -> Vec<Appointment> {
        self.queues.peek_all().cloned().collect()
    }

    /// Snapshot of pending appointments accepted by `predicate`, in serving
    /// order.
    pub fn list_pending_where<P>(&self, predicate: P) -> Vec<Appointment>
    where
        P: Fn(&Appointment) -> bool,
    {
        self.queues
            .peek_all()
            .filter(|&a| predicate(a))
            .cloned()
            .collect()
    }

    pub fn get(&self, appointment_id: &str) -> Option<&Appointment> {
        self.queues.get(appointment_id)
    }

    pub fn pending_count(&self) -> usize {
        self.queues.len()
    }

    /// Appointments handed out by `serve_next` and not yet completed or
    /// rescheduled.
    pub fn in_service(&self) -> Vec<Appointment> {
        let mut serving: Vec<Appointment> = self.in_service.values().cloned().collect();
        serving.sort_by_key(Appointment::arrival);
        serving
    }

    pub fn level_counts(&self) -> LevelCounts {
        LevelCounts {
            critical: self.queues.len_of(UrgencyLevel::Critical),
            emergency: self.queues.len_of(UrgencyLevel::Emergency),
            accident: self.queues.len_of(UrgencyLevel::Accident),
            normal: self.queues.len_of(UrgencyLevel::Normal),
        }
    }

    pub fn is_completed(&self, appointment_id: &str) -> bool {
        self.completed.contains(appointment_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
