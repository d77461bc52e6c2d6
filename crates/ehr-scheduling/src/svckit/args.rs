//! Typed Tool Arguments
//!
//! Raw argument text from the model is parsed into a [`SchedulingCall`]
//! before anything touches the gateway, so a call that reaches dispatch has
//! every required field present and well-formed.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::catalog::{
    CHECK_AVAILABILITY, CREATE_APPOINTMENT, CREATE_PATIENT, GET_CLINICIANS, GET_LOCATIONS,
};
use crate::error::{Result, SchedulingError};
use crate::model::{CreateAppointmentRequest, Patient};

/// A validated scheduling tool call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulingCall {
    GetLocations,
    GetClinicians { location_id: Option<String> },
    CheckAvailability { clinician_id: String, date: String },
    CreatePatient(Patient),
    CreateAppointment(CreateAppointmentRequest),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClinicianFilter {
    #[serde(default)]
    location_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityArgs {
    clinician_id: String,
    date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentArgs {
    patient_data: Patient,
    clinician_id: String,
    location_id: String,
    time_slot_id: String,
    reason: String,
}

impl SchedulingCall {
    /// Parse a model-issued call; empty argument text counts as `{}`
    pub fn parse(name: &str, raw_arguments: &str) -> Result<Self> {
        let raw = if raw_arguments.trim().is_empty() {
            "{}"
        } else {
            raw_arguments
        };

        let call = match name {
            GET_LOCATIONS => Self::GetLocations,
            GET_CLINICIANS => {
                let filter: ClinicianFilter = decode(name, raw)?;
                Self::GetClinicians {
                    location_id: filter.location_id.filter(|id| !id.trim().is_empty()),
                }
            }
            CHECK_AVAILABILITY => {
                let args: AvailabilityArgs = decode(name, raw)?;
                require(name, "clinicianId", &args.clinician_id)?;
                NaiveDate::parse_from_str(&args.date, "%Y-%m-%d").map_err(|_| {
                    invalid(name, format!("date '{}' is not a YYYY-MM-DD date", args.date))
                })?;
                Self::CheckAvailability {
                    clinician_id: args.clinician_id,
                    date: args.date,
                }
            }
            CREATE_PATIENT => {
                let patient: Patient = decode(name, raw)?;
                validate_patient(name, &patient)?;
                Self::CreatePatient(patient)
            }
            CREATE_APPOINTMENT => {
                let args: AppointmentArgs = decode(name, raw)?;
                validate_patient(name, &args.patient_data)?;
                require(name, "clinicianId", &args.clinician_id)?;
                require(name, "locationId", &args.location_id)?;
                require(name, "timeSlotId", &args.time_slot_id)?;
                require(name, "reason", &args.reason)?;
                Self::CreateAppointment(CreateAppointmentRequest {
                    patient: args.patient_data,
                    clinician_id: args.clinician_id,
                    location_id: args.location_id,
                    time_slot_id: args.time_slot_id,
                    reason: args.reason,
                })
            }
            other => return Err(SchedulingError::UnknownTool(other.to_owned())),
        };
        Ok(call)
    }

    /// Tool name this call was parsed from
    pub const fn tool_name(&self) -> &'static str {
        match self {
            Self::GetLocations => GET_LOCATIONS,
            Self::GetClinicians { .. } => GET_CLINICIANS,
            Self::CheckAvailability { .. } => CHECK_AVAILABILITY,
            Self::CreatePatient(_) => CREATE_PATIENT,
            Self::CreateAppointment(_) => CREATE_APPOINTMENT,
        }
    }

    /// Whether executing the call writes to the EHR
    pub const fn has_side_effects(&self) -> bool {
        matches!(self, Self::CreatePatient(_) | Self::CreateAppointment(_))
    }
}

fn decode<T: DeserializeOwned>(tool: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| invalid(tool, e.to_string()))
}

fn validate_patient(tool: &str, patient: &Patient) -> Result<()> {
    require(tool, "firstName", &patient.first_name)?;
    require(tool, "lastName", &patient.last_name)?;
    require(tool, "dateOfBirth", &patient.date_of_birth)?;
    require(tool, "phone", &patient.phone)
}

fn require(tool: &str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(tool, format!("{field} must not be empty")));
    }
    Ok(())
}

fn invalid(tool: &str, reason: impl Into<String>) -> SchedulingError {
    SchedulingError::InvalidArguments {
        tool: tool.to_owned(),
        reason: reason.into(),
    }
}
