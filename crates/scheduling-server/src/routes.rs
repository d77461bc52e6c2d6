//! Router

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::ehr_routes;
use crate::handlers::{
    chat_handler, chat_stream_handler, greeting_handler, health_check, history_handler,
    reset_handler, sessions_handler,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Chat
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/greeting", post(greeting_handler))
        .route("/api/chat/reset", post(reset_handler))
        .route("/api/chat/history/{session_id}", get(history_handler))
        .route("/api/chat/sessions", get(sessions_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        // EHR
        .route("/api/locations", get(ehr_routes::list_locations))
        .route("/api/locations/{id}", get(ehr_routes::get_location))
        .route("/api/clinicians", get(ehr_routes::list_clinicians))
        .route("/api/clinicians/{id}", get(ehr_routes::get_clinician))
        .route(
            "/api/clinicians/location/{location_id}",
            get(ehr_routes::clinicians_by_location),
        )
        .route(
            "/api/availability/{clinician_id}/{date}",
            get(ehr_routes::availability),
        )
        .route(
            "/api/patients",
            post(ehr_routes::create_patient).get(ehr_routes::list_patients),
        )
        .route("/api/patients/{id}", get(ehr_routes::get_patient))
        .route(
            "/api/appointments",
            post(ehr_routes::create_appointment).get(ehr_routes::list_appointments),
        )
        .route("/api/appointments/{id}", get(ehr_routes::get_appointment))
        .route(
            "/api/appointments/{id}/status",
            put(ehr_routes::update_appointment_status),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use agent_core::{AgentBuilder, AgentError, ScriptedProvider, SessionRegistry, ToolCallRequest};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use ehr_scheduling::{InMemoryEhr, RECEPTIONIST_PROMPT, SchedulingDispatcher, scheduling_tools};
    use futures::{SinkExt, Stream, StreamExt};
    use serde_json::{Value, json};
    use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
    use tower::ServiceExt;

    use super::*;

    fn app(provider: ScriptedProvider) -> (Router, Arc<InMemoryEhr>) {
        let ehr = Arc::new(InMemoryEhr::new());
        let provider = Arc::new(provider);
        let factory = AgentBuilder::new()
            .provider(provider.clone())
            .dispatcher(Arc::new(SchedulingDispatcher::new(ehr.clone())))
            .tools(scheduling_tools().unwrap())
            .system_prompt(RECEPTIONIST_PROMPT)
            .build_factory()
            .unwrap();

        let state = AppState {
            provider,
            sessions: Arc::new(SessionRegistry::new(factory)),
            ehr: ehr.clone(),
            fragment_delay: Duration::ZERO,
        };
        (build_router(state), ehr)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(ScriptedProvider::new());
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["llmConnected"], true);
    }

    #[tokio::test]
    async fn test_chat_turn_and_history() {
        let (app, _) = app(ScriptedProvider::new().then_text("Hi! How can I help?"));

        let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"message": "Hello"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "Hi! How can I help?", "sessionId": "default"}));

        let (status, body) = send(&app, "GET", "/api/chat/history/default", None).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["content"], "Hi! How can I help?");

        let (_, body) = send(&app, "GET", "/api/chat/sessions", None).await;
        assert_eq!(body, json!({"sessions": ["default"], "count": 1}));
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let (app, _) = app(ScriptedProvider::new());
        let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"sessionId": "s1"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_chat_provider_failure_is_500() {
        let (app, _) = app(ScriptedProvider::new().then_fail("connection refused"));
        let (status, body) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({"message": "Hello", "sessionId": "s1"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process message");
        assert!(!body["details"].as_str().unwrap().contains("connection refused"));

        let (_, history) = send(&app, "GET", "/api/chat/history/s1", None).await;
        assert_eq!(history["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_greeting_and_reset() {
        let (app, _) = app(ScriptedProvider::new().then_text("Welcome to the clinic!"));

        let (status, body) = send(
            &app,
            "POST",
            "/api/chat/greeting",
            Some(json!({"sessionId": "g"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Welcome to the clinic!");

        let (status, _) = send(&app, "POST", "/api/chat/reset", Some(json!({"sessionId": "g"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, history) = send(&app, "GET", "/api/chat/history/g", None).await;
        assert!(history["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_history_is_404() {
        let (app, _) = app(ScriptedProvider::new());
        let (status, _) = send(&app, "GET", "/api/chat/history/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/api/chat/reset", Some(json!({"sessionId": "nobody"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", "/api/chat/sessions", None).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_ehr_routes() {
        let (app, _) = app(ScriptedProvider::new());

        let (_, locations) = send(&app, "GET", "/api/locations", None).await;
        assert_eq!(locations.as_array().unwrap().len(), 3);

        let (_, downtown) = send(&app, "GET", "/api/clinicians/location/loc-1", None).await;
        assert_eq!(downtown.as_array().unwrap().len(), 2);

        let (status, body) = send(&app, "GET", "/api/clinicians/doc-9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("doc-9"));

        let (_, all) = send(
            &app,
            "GET",
            "/api/availability/doc-1/2025-01-10?includeUnavailable=true",
            None,
        )
        .await;
        assert_eq!(all["slots"].as_array().unwrap().len(), 12);

        let (_, open) = send(&app, "GET", "/api/availability/doc-1/2025-01-10", None).await;
        let open = open["slots"].as_array().unwrap();
        assert!(open.iter().all(|s| s["available"] == true));

        let (status, _) = send(&app, "GET", "/api/availability/doc-1/tomorrow", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_appointment_lifecycle() {
        let (app, ehr) = app(ScriptedProvider::new());
        let slot = ehr.availability("doc-2", "2025-04-07", false).await.unwrap().slots[0].clone();

        let (status, created) = send(
            &app,
            "POST",
            "/api/appointments",
            Some(json!({
                "patient": {"firstName": "Ada", "lastName": "Lovelace", "dateOfBirth": "1815-12-10", "phone": "555-0100"},
                "clinicianId": "doc-2",
                "locationId": "loc-1",
                "timeSlotId": slot.id,
                "reason": "Annual physical"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["appointment"]["id"].as_str().unwrap().to_owned();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/appointments/{id}/status"),
            Some(json!({"status": "confirmed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "confirmed");

        let (_, patients) = send(&app, "GET", "/api/patients", None).await;
        assert_eq!(patients.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agent_books_through_shared_backend() {
        let ehr_probe = InMemoryEhr::new();
        let slot = ehr_probe
            .availability("doc-5", "2025-05-12", false)
            .await
            .unwrap()
            .slots[0]
            .clone();
        let arguments = json!({
            "patientData": {"firstName": "Grace", "lastName": "Hopper", "dateOfBirth": "1906-12-09", "phone": "555-0199"},
            "clinicianId": "doc-5",
            "locationId": "loc-3",
            "timeSlotId": slot.id,
            "reason": "Checkup"
        });

        let provider = ScriptedProvider::new()
            .then_tool_calls(vec![ToolCallRequest::new(
                "call_1",
                "create_appointment",
                arguments.to_string(),
            )])
            .then_text("You're booked with Dr. Lisa Thompson.");
        let (app, _) = app(provider);

        let (status, body) = send(
            &app,
            "POST",
            "/api/chat",
            Some(json!({"message": "Book it please", "sessionId": "b"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "You're booked with Dr. Lisa Thompson.");

        let (_, appointments) = send(&app, "GET", "/api/appointments", None).await;
        let appointments = appointments.as_array().unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0]["timeSlotId"], slot.id);
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("ws://{addr}/api/chat/stream")
    }

    async fn next_frame<S>(ws: &mut S) -> Value
    where
        S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
    {
        loop {
            if let WsMessage::Text(text) = ws.next().await.unwrap().unwrap() {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_stream_frames() {
        let reply = "We have three locations:\n1. Downtown\n2. Westside";
        let provider = ScriptedProvider::new()
            .then_text(reply)
            .then_fail("connection refused");
        let (app, _) = app(provider);
        let (mut ws, _) = tokio_tungstenite::connect_async(serve(app).await)
            .await
            .unwrap();

        ws.send(WsMessage::Text(json!({"message": "  "}).to_string().into()))
            .await
            .unwrap();
        let frame = next_frame(&mut ws).await;
        assert_eq!(frame, json!({"type": "error", "error": "Message is required"}));

        ws.send(WsMessage::Text("not json".into())).await.unwrap();
        assert_eq!(next_frame(&mut ws).await["type"], "error");

        ws.send(WsMessage::Text(
            json!({"message": "Where are you?", "sessionId": "ws"}).to_string().into(),
        ))
        .await
        .unwrap();
        let mut streamed = String::new();
        let done = loop {
            let frame = next_frame(&mut ws).await;
            match frame["type"].as_str() {
                Some("chunk") => streamed.push_str(frame["content"].as_str().unwrap()),
                _ => break frame,
            }
        };
        assert_eq!(streamed, reply);
        assert_eq!(done, json!({"type": "done", "sessionId": "ws"}));

        ws.send(WsMessage::Text(
            json!({"message": "Still there?", "sessionId": "ws"}).to_string().into(),
        ))
        .await
        .unwrap();
        let frame = next_frame(&mut ws).await;
        assert_eq!(frame["type"], "error");
        assert_eq!(
            frame["error"],
            AgentError::ProviderUnavailable(String::new()).user_message()
        );
    }
}
