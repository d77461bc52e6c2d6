//! EHR REST Handlers
//!
//! JSON surface over the in-memory backend, mirroring what a remote EHR
//! exposes to `HttpEhrGateway`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use ehr_scheduling::{
    Appointment, AppointmentStatus, Availability, Clinician, CreateAppointmentRequest,
    EhrGateway, Location, Patient, SchedulingError,
    model::{AppointmentCreated, PatientCreated},
};

use crate::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn ehr_error(err: SchedulingError) -> ApiError {
    let status = match &err {
        SchedulingError::NotFound { .. } => StatusCode::NOT_FOUND,
        SchedulingError::InvalidRequest(_) | SchedulingError::InvalidArguments { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => {
            tracing::error!(error = %err, "EHR request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

fn not_found(kind: &'static str, id: &str) -> ApiError {
    ehr_error(SchedulingError::not_found(kind, id))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub include_unavailable: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

// ============================================================================
// Locations & Clinicians
// ============================================================================

pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    state.ehr.list_locations().await.map(Json).map_err(ehr_error)
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Location> {
    state
        .ehr
        .location(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Location", &id))
}

pub async fn list_clinicians(State(state): State<AppState>) -> ApiResult<Vec<Clinician>> {
    state.ehr.list_clinicians().await.map(Json).map_err(ehr_error)
}

pub async fn get_clinician(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Clinician> {
    state
        .ehr
        .clinician(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Clinician", &id))
}

pub async fn clinicians_by_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> ApiResult<Vec<Clinician>> {
    state
        .ehr
        .list_clinicians_by_location(&location_id)
        .await
        .map(Json)
        .map_err(ehr_error)
}

// ============================================================================
// Availability
// ============================================================================

/// Open slots by default; `?includeUnavailable=true` returns every slot
pub async fn availability(
    State(state): State<AppState>,
    Path((clinician_id, date)): Path<(String, String)>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Availability> {
    state
        .ehr
        .availability(&clinician_id, &date, query.include_unavailable)
        .await
        .map(Json)
        .map_err(ehr_error)
}

// ============================================================================
// Patients & Appointments
// ============================================================================

pub async fn create_patient(
    State(state): State<AppState>,
    Json(patient): Json<Patient>,
) -> Result<(StatusCode, Json<PatientCreated>), ApiError> {
    let created = state.ehr.create_patient(patient).await.map_err(ehr_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_patients(State(state): State<AppState>) -> Json<Vec<Patient>> {
    Json(state.ehr.patients().await)
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Patient> {
    state
        .ehr
        .patient(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Patient", &id))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentCreated>), ApiError> {
    let created = state
        .ehr
        .create_appointment(request)
        .await
        .map_err(ehr_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_appointments(State(state): State<AppState>) -> Json<Vec<Appointment>> {
    Json(state.ehr.appointments().await)
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Appointment> {
    state
        .ehr
        .appointment(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Appointment", &id))
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Appointment> {
    state
        .ehr
        .update_status(&id, update.status)
        .await
        .map(Json)
        .map_err(ehr_error)
}
