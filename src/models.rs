/// Data models for the appointment queue.
///
/// This module defines the core data structures used throughout the system:
/// - UrgencyLevel: the four ordered urgency levels
/// - AppointmentStatus: lifecycle state of an appointment
/// - Appointment: a queued (or completed) appointment record
/// - AppointmentRequest: validated input for registering an appointment

use crate::error::{Result, SchedulerError};
use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Urgency levels for appointments.
///
/// Higher numeric values indicate higher urgency. Critical patients are
/// served first, followed by emergency, accident, then normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Normal = 1,
    Accident = 2,
    Emergency = 3,
    Critical = 4,
}

impl UrgencyLevel {
    /// All levels in serving order.
    pub const ALL: [UrgencyLevel; 4] = [
        UrgencyLevel::Critical,
        UrgencyLevel::Emergency,
        UrgencyLevel::Accident,
        UrgencyLevel::Normal,
    ];

    /// Convert a string to an UrgencyLevel. Case and surrounding whitespace
    /// are ignored.
    pub fn from_string(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "critical" => Ok(UrgencyLevel::Critical),
            "emergency" => Ok(UrgencyLevel::Emergency),
            "accident" => Ok(UrgencyLevel::Accident),
            "normal" => Ok(UrgencyLevel::Normal),
            _ => Err(SchedulerError::InvalidLevel(value.to_string())),
        }
    }

    /// Position in serving order: 0 for Critical through 3 for Normal.
    pub fn rank(&self) -> usize {
        match self {
            UrgencyLevel::Critical => 0,
            UrgencyLevel::Emergency => 1,
            UrgencyLevel::Accident => 2,
            UrgencyLevel::Normal => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "CRITICAL",
            UrgencyLevel::Emergency => "EMERGENCY",
            UrgencyLevel::Accident => "ACCIDENT",
            UrgencyLevel::Normal => "NORMAL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::Emergency => "emergency",
            UrgencyLevel::Accident => "accident",
            UrgencyLevel::Normal => "normal",
        }
    }
}

impl FromStr for UrgencyLevel {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        UrgencyLevel::from_string(s)
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Completed,
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SchedulerError::InvalidRequest(format!("invalid date '{}'", value)))
}

/// Parse a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| SchedulerError::InvalidRequest(format!("invalid time '{}'", value)))
}

/// A patient's request to be queued, validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub level: UrgencyLevel,
    pub doctor: Option<String>,
}

impl AppointmentRequest {
    /// Create a new appointment request with validation.
    pub fn new(
        patient_name: String,
        date: NaiveDate,
        time: NaiveTime,
        level: UrgencyLevel,
        doctor: Option<String>,
    ) -> Result<Self> {
        let patient_name = patient_name.trim().to_string();
        if patient_name.is_empty() {
            return Err(SchedulerError::InvalidRequest(
                "patient name cannot be empty".to_string(),
            ));
        }

        let doctor = doctor
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(AppointmentRequest {
            patient_name,
            date,
            time,
            level,
            doctor,
        })
    }
}

/// An appointment known to the scheduler.
///
/// `sequence` is the arrival sequence number. It is `None` until the record
/// is enqueued and is never changed afterwards, including by a reschedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub level: UrgencyLevel,
    pub doctor: Option<String>,
    pub sequence: Option<u64>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Local>,
}

impl Appointment {
    /// Build a fresh record from a validated request.
    pub fn from_request(request: AppointmentRequest) -> Self {
        Appointment {
            appointment_id: Uuid::new_v4().to_string(),
            patient_name: request.patient_name,
            date: request.date,
            time: request.time,
            level: request.level,
            doctor: request.doctor,
            sequence: None,
            status: AppointmentStatus::Pending,
            created_at: Local::now(),
        }
    }

    /// Arrival sequence used for ordering. Unassigned records sort last.
    pub fn arrival(&self) -> u64 {
        self.sequence.unwrap_or(u64::MAX)
    }

    pub fn is_pending(&self) -> bool {
        self.status == AppointmentStatus::Pending
    }

    /// Case-insensitive substring match on name, date, time or level.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.patient_name.to_lowercase().contains(&query)
            || self.date.format("%Y-%m-%d").to_string().contains(&query)
            || self.time.format("%H:%M").to_string().contains(&query)
            || self.level.as_str().contains(&query)
    }
}

/// Factory function to create an appointment request from raw form fields.
pub fn create_appointment_request(
    patient_name: &str,
    date: &str,
    time: &str,
    level: &str,
    doctor: Option<&str>,
) -> Result<AppointmentRequest> {
    let level = UrgencyLevel::from_string(level)?;
    let date = parse_date(date)?;
    let time = parse_time(time)?;

    AppointmentRequest::new(
        patient_name.to_string(),
        date,
        time,
        level,
        doctor.map(str::to_string),
    )
}
