pub mod account;
pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{middleware::Condition, web};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::auth::{ApiKeyMiddleware, AuthMiddleware};
use crate::error::AppError;
use crate::state::AppState;

/// Mounts `/health` and the `/api` tree.
///
/// The key gate (when configured) wraps all of `/api`; the bearer check wraps
/// only the account and task scopes. Registration and login stay public.
pub fn config(cfg: &mut web::ServiceConfig, state: &AppState) {
    let gate_key = state.api_key.clone();
    let key_gate = Condition::new(
        gate_key.is_some(),
        ApiKeyMiddleware::new(gate_key.unwrap_or_else(|| Arc::from(""))),
    );

    cfg.app_data(state.gateway.clone())
        .app_data(state.tasks.clone())
        .app_data(json_config())
        .app_data(query_config())
        .service(health::health)
        .service(
            web::scope("/api")
                .wrap(key_gate)
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login),
                )
                .service(
                    web::scope("/account")
                        .wrap(AuthMiddleware::new(state.gateway.clone()))
                        .service(account::get_account)
                        .service(account::delete_account),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware::new(state.gateway.clone()))
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}

/// A JSON body that must be an object. Arrays and scalars are rejected by the
/// extractor before any field is read.
pub type ObjectBody = web::Json<Map<String, Value>>;

/// Decodes an object body into a request type.
pub(crate) fn decode_object<T: DeserializeOwned>(body: ObjectBody) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(body.into_inner())).map_err(|e| {
        log::debug!("rejected body: {}", e);
        AppError::ValidationError(INVALID_BODY.into())
    })
}

const INVALID_BODY: &str = "Invalid request body";

/// Unparsable bodies are answered with the common envelope instead of actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("rejected body on {}: {}", req.path(), err);
        AppError::ValidationError(INVALID_BODY.into()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        log::debug!("rejected query on {}: {}", req.path(), err);
        AppError::ValidationError("Invalid query string".into()).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RegisterRequest;
    use serde_json::json;

    fn body(value: Value) -> ObjectBody {
        match value {
            Value::Object(map) => web::Json(map),
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn decode_object_reads_named_fields() {
        let request: RegisterRequest =
            decode_object(body(json!({ "name": "Ana", "email": "ana@example.com", "password": "pw" }))).unwrap();
        assert_eq!(request.name, "Ana");
        assert_eq!(request.email, "ana@example.com");
    }

    #[test]
    fn decode_object_hides_serde_details() {
        let result: Result<RegisterRequest, _> = decode_object(body(json!({ "name": 42 })));
        match result {
            Err(AppError::ValidationError(message)) => assert_eq!(message, "Invalid request body"),
            other => panic!("expected a validation error, got {:?}", other.map(|r| r.name)),
        }
    }

    #[test]
    fn object_body_refuses_arrays() {
        assert!(serde_json::from_value::<Map<String, Value>>(json!(["not", "an", "object"])).is_err());
    }
}
