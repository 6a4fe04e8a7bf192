use crate::{
    auth::AuthGateway,
    error::AppError,
    response::ApiResponse,
    routes::{decode_object, ObjectBody},
};
use actix_web::{post, web, HttpResponse, Responder};

/// Register a new user
///
/// Creates a new user account and returns its identity with an authentication token.
///
/// ## Responses:
/// - `201 Created`: `data` holds `userId`, `name`, `email` and `token`.
/// - `400 Bad Request`: A field is missing/empty or the email is already registered.
#[post("/register")]
pub async fn register(
    gateway: web::Data<AuthGateway>,
    register_data: ObjectBody,
) -> Result<impl Responder, AppError> {
    let auth = gateway.register(decode_object(register_data)?).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("User registered successfully", auth)))
}

/// Login user
///
/// Authenticates a user and returns a fresh authentication token.
///
/// ## Responses:
/// - `200 OK`: `data` holds `userId`, `name`, `email` and `token`.
/// - `400 Bad Request`: Email or password missing.
/// - `401 Unauthorized`: Unknown email or wrong password (same message for both).
#[post("/login")]
pub async fn login(
    gateway: web::Data<AuthGateway>,
    login_data: ObjectBody,
) -> Result<impl Responder, AppError> {
    let auth = gateway.login(decode_object(login_data)?).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Login successful", auth)))
}
