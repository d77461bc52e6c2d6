//! In-Memory EHR
//!
//! Mock scheduling backend for demos and tests. Locations and clinicians are
//! static, time slots are generated per clinician and day, and patients and
//! appointments live in memory for the lifetime of the process.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EhrGateway;
use crate::error::{Result, SchedulingError};
use crate::model::{
    Appointment, AppointmentCreated, AppointmentStatus, Availability, Clinician,
    CreateAppointmentRequest, Location, Patient, PatientCreated, TimeSlot,
};

/// Daily slot start times; each slot lasts 30 minutes
const SLOT_TIMES: [&str; 12] = [
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "14:00", "14:30", "15:00", "15:30",
    "16:00", "16:30",
];

/// Out of ten: slots whose hash bucket is below this are taken
const TAKEN_BUCKETS: u64 = 3;

#[derive(Default)]
struct Records {
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    booked_slots: HashSet<String>,
}

/// Mock EHR backend
pub struct InMemoryEhr {
    locations: Vec<Location>,
    clinicians: Vec<Clinician>,
    records: RwLock<Records>,
}

impl Default for InMemoryEhr {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEhr {
    pub fn new() -> Self {
        Self {
            locations: seed_locations(),
            clinicians: seed_clinicians(),
            records: RwLock::new(Records::default()),
        }
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn clinician(&self, id: &str) -> Option<&Clinician> {
        self.clinicians.iter().find(|c| c.id == id)
    }

    /// Slots for a clinician on a day; taken slots only when asked for
    pub async fn availability(
        &self,
        clinician_id: &str,
        date: &str,
        include_unavailable: bool,
    ) -> Result<Availability> {
        if self.clinician(clinician_id).is_none() {
            return Err(SchedulingError::not_found("Clinician", clinician_id));
        }
        parse_date(date)?;

        let records = self.records.read().await;
        let slots = generate_slots(clinician_id, date)
            .into_iter()
            .map(|mut slot| {
                if records.booked_slots.contains(&slot.id) {
                    slot.available = false;
                }
                slot
            })
            .filter(|slot| include_unavailable || slot.available)
            .collect();

        Ok(Availability {
            clinician_id: clinician_id.to_owned(),
            date: date.to_owned(),
            slots,
        })
    }

    pub async fn patient(&self, id: &str) -> Option<Patient> {
        self.records
            .read()
            .await
            .patients
            .iter()
            .find(|p| p.id.as_deref() == Some(id))
            .cloned()
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.records.read().await.patients.clone()
    }

    pub async fn appointment(&self, id: &str) -> Option<Appointment> {
        self.records
            .read()
            .await
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.records.read().await.appointments.clone()
    }

    /// Change an appointment's status; cancelling frees its slot
    pub async fn update_status(&self, id: &str, status: AppointmentStatus) -> Result<Appointment> {
        let mut records = self.records.write().await;
        let appointment = records
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| SchedulingError::not_found("Appointment", id))?;
        appointment.status = status;
        let updated = appointment.clone();

        if status == AppointmentStatus::Cancelled {
            records.booked_slots.remove(&updated.time_slot_id);
        }
        tracing::info!(appointment = %id, %status, "Appointment status updated");
        Ok(updated)
    }

    fn store_patient(records: &mut Records, mut patient: Patient) -> Patient {
        if patient.id.is_none() {
            patient.id = Some(format!("patient-{}", Uuid::new_v4().simple()));
        }
        records.patients.push(patient.clone());
        patient
    }
}

#[async_trait]
impl EhrGateway for InMemoryEhr {
    async fn list_locations(&self) -> Result<Vec<Location>> {
        Ok(self.locations.clone())
    }

    async fn list_clinicians(&self) -> Result<Vec<Clinician>> {
        Ok(self.clinicians.clone())
    }

    async fn list_clinicians_by_location(&self, location_id: &str) -> Result<Vec<Clinician>> {
        Ok(self
            .clinicians
            .iter()
            .filter(|c| c.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn get_availability(&self, clinician_id: &str, date: &str) -> Result<Availability> {
        self.availability(clinician_id, date, true).await
    }

    async fn create_patient(&self, patient: Patient) -> Result<PatientCreated> {
        let mut records = self.records.write().await;
        let patient = Self::store_patient(&mut records, patient);
        tracing::info!(
            patient_id = patient.id.as_deref().unwrap_or_default(),
            name = %patient.full_name(),
            "Patient information saved"
        );

        Ok(PatientCreated {
            message: "Patient information saved successfully".into(),
            patient,
        })
    }

    async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentCreated> {
        let clinician = self
            .clinician(&request.clinician_id)
            .ok_or_else(|| SchedulingError::not_found("Clinician", &request.clinician_id))?;
        if self.location(&request.location_id).is_none() {
            return Err(SchedulingError::not_found("Location", &request.location_id));
        }
        if clinician.location_id != request.location_id {
            return Err(SchedulingError::InvalidRequest(format!(
                "{} does not practice at location {}",
                clinician.name, request.location_id
            )));
        }

        let slot = resolve_slot(&request.clinician_id, &request.time_slot_id)
            .ok_or_else(|| SchedulingError::not_found("Time slot", &request.time_slot_id))?;

        let mut records = self.records.write().await;
        if !slot.available || records.booked_slots.contains(&slot.id) {
            return Err(SchedulingError::InvalidRequest(format!(
                "Time slot {} is no longer available",
                slot.id
            )));
        }

        let known = request
            .patient
            .id
            .as_deref()
            .and_then(|id| records.patients.iter().find(|p| p.id.as_deref() == Some(id)))
            .cloned();
        let patient = match known {
            Some(patient) => patient,
            None => Self::store_patient(&mut records, request.patient),
        };
        let patient_id = patient.id.clone().unwrap_or_default();

        let appointment = Appointment {
            id: format!("appt-{}", Uuid::new_v4().simple()),
            patient_id,
            clinician_id: request.clinician_id,
            location_id: request.location_id,
            time_slot_id: slot.id.clone(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            reason: request.reason,
            status: AppointmentStatus::Scheduled,
            created_at: Utc::now(),
        };
        records.booked_slots.insert(slot.id);
        records.appointments.push(appointment.clone());

        tracing::info!(
            appointment_id = %appointment.id,
            patient = %patient.full_name(),
            clinician = %appointment.clinician_id,
            date = %appointment.date,
            start = %appointment.start_time,
            "Appointment booked"
        );

        Ok(AppointmentCreated {
            message: "Appointment created successfully!".into(),
            appointment,
        })
    }

    fn name(&self) -> &str {
        "InMemoryEhr"
    }
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| SchedulingError::InvalidRequest(format!("Invalid date '{date}', expected YYYY-MM-DD")))
}

/// All slots for a clinician on a day, before bookings are applied
fn generate_slots(clinician_id: &str, date: &str) -> Vec<TimeSlot> {
    SLOT_TIMES
        .iter()
        .enumerate()
        .map(|(index, start)| {
            let id = format!("slot-{clinician_id}-{date}-{index}");
            TimeSlot {
                available: stable_hash(&id) % 10 >= TAKEN_BUCKETS,
                id,
                start_time: (*start).to_owned(),
                end_time: slot_end(start),
                date: date.to_owned(),
            }
        })
        .collect()
}

/// Find the generated slot behind `slot-{clinician}-{date}-{index}`
fn resolve_slot(clinician_id: &str, slot_id: &str) -> Option<TimeSlot> {
    let rest = slot_id.strip_prefix(&format!("slot-{clinician_id}-"))?;
    let date = rest.get(..10)?;
    let index: usize = rest.get(10..)?.strip_prefix('-')?.parse().ok()?;
    parse_date(date).ok()?;
    generate_slots(clinician_id, date).into_iter().nth(index)
}

fn slot_end(start: &str) -> String {
    match start.split_once(':') {
        Some((hour, "30")) => {
            let hour: u32 = hour.parse().unwrap_or_default();
            format!("{:02}:00", hour + 1)
        }
        Some((hour, _)) => format!("{hour}:30"),
        None => start.to_owned(),
    }
}

/// FNV-1a; availability must not change between queries or restarts
fn stable_hash(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn seed_locations() -> Vec<Location> {
    [
        ("loc-1", "Downtown Medical Center", "123 Main Street", "(555) 123-4567", "New York", "10001"),
        ("loc-2", "Westside Health Clinic", "456 Oak Avenue", "(555) 234-5678", "New York", "10025"),
        ("loc-3", "Brooklyn Family Practice", "789 Brooklyn Bridge Blvd", "(555) 345-6789", "Brooklyn", "11201"),
    ]
    .into_iter()
    .map(|(id, name, address, phone, city, zip)| Location {
        id: id.into(),
        name: name.into(),
        address: address.into(),
        phone: phone.into(),
        city: city.into(),
        state: "NY".into(),
        zip_code: zip.into(),
    })
    .collect()
}

fn seed_clinicians() -> Vec<Clinician> {
    [
        ("doc-1", "Dr. Sarah Johnson", "Family Medicine", "loc-1", "sarah.johnson@example.com"),
        ("doc-2", "Dr. Michael Chen", "Internal Medicine", "loc-1", "michael.chen@example.com"),
        ("doc-3", "Dr. Emily Rodriguez", "Pediatrics", "loc-2", "emily.rodriguez@example.com"),
        ("doc-4", "Dr. James Wilson", "Cardiology", "loc-2", "james.wilson@example.com"),
        ("doc-5", "Dr. Lisa Thompson", "Family Medicine", "loc-3", "lisa.thompson@example.com"),
    ]
    .into_iter()
    .map(|(id, name, specialty, location_id, email)| Clinician {
        id: id.into(),
        name: name.into(),
        specialty: specialty.into(),
        location_id: location_id.into(),
        email: email.into(),
    })
    .collect()
}
