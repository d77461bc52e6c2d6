//! EHR Gateway
//!
//! Read/write facade over the scheduling backend, used by the tool
//! dispatcher. Two implementations: an in-process mock backend and an HTTP
//! client for the same API exposed remotely.

mod http;
mod memory;

pub use http::{HttpEhrConfig, HttpEhrGateway};
pub use memory::InMemoryEhr;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    AppointmentCreated, Availability, Clinician, CreateAppointmentRequest, Location, Patient,
    PatientCreated,
};

/// Backend data gateway (Strategy pattern)
#[async_trait]
pub trait EhrGateway: Send + Sync {
    /// All office locations
    async fn list_locations(&self) -> Result<Vec<Location>>;

    /// All clinicians
    async fn list_clinicians(&self) -> Result<Vec<Clinician>>;

    /// Clinicians working at `location_id`
    async fn list_clinicians_by_location(&self, location_id: &str) -> Result<Vec<Clinician>>;

    /// Every slot (open and taken) for a clinician on an ISO date
    async fn get_availability(&self, clinician_id: &str, date: &str) -> Result<Availability>;

    /// Store a patient; the backend assigns the id
    async fn create_patient(&self, patient: Patient) -> Result<PatientCreated>;

    /// Book an appointment
    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentCreated>;

    /// Gateway name for logs
    fn name(&self) -> &str;
}
