//! # ehr-scheduling
//!
//! Medical-office scheduling for the appointment agent: the tool catalogue
//! offered to the model, the dispatcher that executes tool calls, and the
//! EHR gateways those calls read from and write to.
//!
//! ## Booking flow
//!
//! ```text
//! get_locations ──► get_clinicians ──► check_availability
//!                                            │
//!                      create_patient ◄──────┤
//!                                            ▼
//!                                   create_appointment
//! ```
//!
//! Every tool call is answered with a JSON payload. Failures never abort the
//! conversation; they come back as `{"error": "Tool execution failed: ..."}`
//! for the model to explain.

pub mod error;
pub mod gateway;
pub mod model;
pub mod svckit;

pub use error::{Result, SchedulingError};
pub use gateway::{EhrGateway, HttpEhrConfig, HttpEhrGateway, InMemoryEhr};
pub use model::{
    Appointment, AppointmentStatus, Availability, Clinician, CreateAppointmentRequest, Location,
    Patient, TimeSlot,
};
pub use svckit::{SchedulingCall, SchedulingDispatcher, scheduling_tools};

/// System prompt for the front desk receptionist agent
pub const RECEPTIONIST_PROMPT: &str = r"You are a friendly and professional front desk receptionist at a medical office. You help patients schedule appointments by collecting the details you need and using the scheduling tools for real-time data.

## Responsibilities

1. Greet patients warmly and explain that you can help them schedule an appointment
2. Use the tools to look up:
   - Office locations and their details
   - Clinicians at each location and their specialties
   - Open appointment slots for a clinician on a given date
3. Create the patient record and the appointment once everything is confirmed

## Guidelines

- Be conversational and friendly, not robotic
- Ask for information gradually; never request everything at once
- Always check actual availability before suggesting times, and only offer slots marked available
- Dates go to the tools as YYYY-MM-DD
- Use `create_patient` once you have first name, last name, date of birth and phone number
- Use `create_appointment` only after the patient has confirmed location, clinician, time and reason
- Read the booked details back to the patient to confirm accuracy
- If a tool reports an error, explain it plainly and offer an alternative

## Tools Available

- `get_locations` - All office locations
- `get_clinicians` - All clinicians, or those at one location
- `check_availability` - Slots for a clinician on a date
- `create_patient` - Save patient information
- `create_appointment` - Book the appointment";
