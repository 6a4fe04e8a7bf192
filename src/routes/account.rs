use crate::{
    auth::{AuthGateway, AuthenticatedUser},
    error::AppError,
    response::ApiResponse,
};
use actix_web::{delete, get, web, HttpResponse, Responder};

/// Returns the caller's profile. The password hash is never part of it.
#[get("")]
pub async fn get_account(
    gateway: web::Data<AuthGateway>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = gateway.profile(user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Account retrieved", profile)))
}

/// Deletes the caller's account and all of its tasks.
///
/// Tokens already issued stay cryptographically valid until they expire, but
/// every task operation they authorize is scoped to an owner with no tasks.
#[delete("")]
pub async fn delete_account(
    gateway: web::Data<AuthGateway>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    gateway.delete_account(user.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Account deleted")))
}
