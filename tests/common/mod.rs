#![allow(dead_code)]

use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test};
use serde_json::json;
use studytasks::auth::{AuthResponse, PasswordHasher, TokenService};
use studytasks::response::ApiResponse;
use studytasks::AppState;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "Password123!";

/// In-memory state with the cheapest bcrypt cost so the suite stays fast.
pub fn test_state(api_key: Option<&str>) -> AppState {
    AppState::in_memory(
        TokenService::new(TEST_SECRET).expect("test secret is valid"),
        PasswordHasher::new(4).expect("bcrypt cost 4 is valid"),
        api_key.map(String::from),
    )
}

// Helper struct to hold auth details
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": name,
            "email": email,
            "password": TEST_PASSWORD
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let parsed: ApiResponse<AuthResponse> =
        serde_json::from_slice(&body).map_err(|e| format!("Failed to parse registration response: {}", e))?;
    let auth = parsed.data.ok_or("registration response had no data")?;

    Ok(TestUser {
        id: auth.user_id,
        token: auth.token,
    })
}
