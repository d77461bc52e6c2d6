//! Scheduling Tool Catalogue
//!
//! The five tools offered to the model, in the order they are registered.

use agent_core::{ParameterSchema, Result, ToolDefinition, ToolRegistry};

pub const GET_LOCATIONS: &str = "get_locations";
pub const GET_CLINICIANS: &str = "get_clinicians";
pub const CHECK_AVAILABILITY: &str = "check_availability";
pub const CREATE_PATIENT: &str = "create_patient";
pub const CREATE_APPOINTMENT: &str = "create_appointment";

/// Registry holding every scheduling tool
pub fn scheduling_tools() -> Result<ToolRegistry> {
    ToolRegistry::from_definitions(tool_definitions())
}

/// Tool definitions in registration order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_LOCATIONS.into(),
            description: "Get all available medical office locations".into(),
            parameters: Vec::new(),
            has_side_effects: false,
        },
        ToolDefinition {
            name: GET_CLINICIANS.into(),
            description: "Get all clinicians or clinicians at a specific location".into(),
            parameters: vec![ParameterSchema::optional_string(
                "locationId",
                "Optional location ID to filter clinicians by location",
            )],
            has_side_effects: false,
        },
        ToolDefinition {
            name: CHECK_AVAILABILITY.into(),
            description:
                "Check available appointment slots for a specific clinician on a specific date"
                    .into(),
            parameters: vec![
                ParameterSchema::required_string("clinicianId", "The ID of the clinician"),
                ParameterSchema::required_string("date", "The date in YYYY-MM-DD format"),
            ],
            has_side_effects: false,
        },
        ToolDefinition {
            name: CREATE_PATIENT.into(),
            description: "Create a patient record in the system".into(),
            parameters: patient_fields(false),
            has_side_effects: true,
        },
        ToolDefinition {
            name: CREATE_APPOINTMENT.into(),
            description: "Create an appointment in the system".into(),
            parameters: vec![
                ParameterSchema::object(
                    "patientData",
                    "Patient information object",
                    true,
                    patient_fields(true),
                ),
                ParameterSchema::required_string("clinicianId", "The ID of the clinician"),
                ParameterSchema::required_string("locationId", "The ID of the location"),
                ParameterSchema::required_string("timeSlotId", "The ID of the selected time slot"),
                ParameterSchema::required_string("reason", "Reason for the appointment"),
            ],
            has_side_effects: true,
        },
    ]
}

fn patient_fields(with_id: bool) -> Vec<ParameterSchema> {
    let mut fields = Vec::with_capacity(7);
    if with_id {
        fields.push(ParameterSchema::optional_string(
            "id",
            "Existing patient ID, if already created",
        ));
    }
    fields.extend([
        ParameterSchema::required_string("firstName", "Patient's first name"),
        ParameterSchema::required_string("lastName", "Patient's last name"),
        ParameterSchema::required_string(
            "dateOfBirth",
            "Patient's date of birth in YYYY-MM-DD format",
        ),
        ParameterSchema::required_string("phone", "Patient's phone number"),
        ParameterSchema::optional_string("email", "Patient's email address (optional)"),
        ParameterSchema::optional_string(
            "insurance",
            "Patient's insurance information (optional)",
        ),
    ]);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_order() {
        let registry = scheduling_tools().unwrap();
        assert_eq!(
            registry.names(),
            vec![
                GET_LOCATIONS,
                GET_CLINICIANS,
                CHECK_AVAILABILITY,
                CREATE_PATIENT,
                CREATE_APPOINTMENT
            ]
        );
    }

    #[test]
    fn test_appointment_schema_nests_patient() {
        let registry = scheduling_tools().unwrap();
        let schema = registry.get(CREATE_APPOINTMENT).unwrap().input_schema();

        assert_eq!(
            schema["required"],
            json!(["patientData", "clinicianId", "locationId", "timeSlotId", "reason"])
        );
        assert_eq!(
            schema["properties"]["patientData"]["required"],
            json!(["firstName", "lastName", "dateOfBirth", "phone"])
        );
        assert!(schema["properties"]["patientData"]["properties"]["id"].is_object());
    }

    #[test]
    fn test_side_effects_flagged() {
        let flagged: Vec<_> = tool_definitions()
            .into_iter()
            .filter(|t| t.has_side_effects)
            .map(|t| t.name)
            .collect();
        assert_eq!(flagged, vec![CREATE_PATIENT, CREATE_APPOINTMENT]);
    }
}
