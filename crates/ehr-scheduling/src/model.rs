//! Domain Models
//!
//! EHR records exchanged with the gateway and handed to the model as tool
//! results. Field names are camelCase on the wire, matching the tool schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A medical office location
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// A clinician working at one location
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinician {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub location_id: String,
    pub email: String,
}

/// Patient demographics; `id` is assigned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
}

impl Patient {
    /// "First Last", for logs
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A bookable half-hour slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
    pub date: String,
}

/// Slots for one clinician on one day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub clinician_id: String,
    pub date: String,
    pub slots: Vec<TimeSlot>,
}

impl Availability {
    /// Number of open slots
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.available).count()
    }
}

/// Appointment lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A booked appointment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub clinician_id: String,
    pub location_id: String,
    pub time_slot_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Booking request forwarded to the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient: Patient,
    pub clinician_id: String,
    pub location_id: String,
    pub time_slot_id: String,
    pub reason: String,
}

/// Backend answer to a patient write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientCreated {
    pub message: String,
    pub patient: Patient,
}

/// Backend answer to an appointment write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCreated {
    pub message: String,
    pub appointment: Appointment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_wire_format() {
        let patient: Patient = serde_json::from_str(
            r#"{"firstName":"Ada","lastName":"Lovelace","dateOfBirth":"1815-12-10","phone":"555-0100"}"#,
        )
        .unwrap();
        assert_eq!(patient.full_name(), "Ada Lovelace");
        assert!(patient.id.is_none());

        let json = serde_json::to_value(&patient).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["dateOfBirth"], "1815-12-10");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(AppointmentStatus::Confirmed).unwrap();
        assert_eq!(json, "confirmed");
        assert_eq!(AppointmentStatus::Scheduled.to_string(), "scheduled");
    }
}
