/// Four-level FIFO queue set.
///
/// One `VecDeque` per urgency level, indexed by `UrgencyLevel::rank()`.
/// Treated together the set behaves as a single priority queue: the head of
/// the highest non-empty level is always served first.

use crate::error::{Result, SchedulerError};
use crate::models::{Appointment, UrgencyLevel};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PriorityQueueSet {
    queues: [VecDeque<Appointment>; 4],
}

impl PriorityQueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an appointment to the tail of a level's queue.
    pub fn push(&mut self, level: UrgencyLevel, appointment: Appointment) {
        debug!(
            "Queueing {} at {} (position {})",
            appointment.appointment_id,
            level,
            self.queues[level.rank()].len()
        );
        self.queues[level.rank()].push_back(appointment);
    }

    /// Insert an appointment ahead of the first item with a larger arrival
    /// sequence, keeping the level sorted by seniority.
    pub fn insert_by_sequence(&mut self, level: UrgencyLevel, appointment: Appointment) {
        let queue = &mut self.queues[level.rank()];
        let position = queue
            .iter()
            .position(|a| a.arrival() > appointment.arrival())
            .unwrap_or(queue.len());

        debug!(
            "Reinserting {} at {} (position {})",
            appointment.appointment_id, level, position
        );
        queue.insert(position, appointment);
    }

    /// Remove and return the head of the highest non-empty level.
    pub fn pop_highest(&mut self) -> Option<Appointment> {
        self.queues.iter_mut().find_map(VecDeque::pop_front)
    }

    pub fn peek_highest(&self) -> Option<&Appointment> {
        self.queues.iter().find_map(VecDeque::front)
    }

    /// Remove an appointment by id from whichever level holds it.
    pub fn remove(&mut self, appointment_id: &str) -> Result<Appointment> {
        for queue in self.queues.iter_mut() {
            if let Some(position) = queue.iter().position(|a| a.appointment_id == appointment_id) {
                if let Some(appointment) = queue.remove(position) {
                    return Ok(appointment);
                }
            }
        }
        Err(SchedulerError::NotFound(appointment_id.to_string()))
    }

    /// All pending appointments in serving order: level outermost, queue
    /// position innermost. Calling again restarts from the head.
    pub fn peek_all(&self) -> impl Iterator<Item = &Appointment> + '_ {
        self.queues.iter().flat_map(|queue| queue.iter())
    }

    pub fn get(&self, appointment_id: &str) -> Option<&Appointment> {
        self.peek_all().find(|a| a.appointment_id == appointment_id)
    }

    pub fn contains(&self, appointment_id: &str) -> bool {
        self.get(appointment_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn len_of(&self, level: UrgencyLevel) -> usize {
        self.queues[level.rank()].len()
    }
}
