//! Composition root: services are built once from explicitly provided stores
//! and shared with every worker.

use actix_web::web;
use std::sync::Arc;

use crate::auth::{AuthGateway, PasswordHasher, TokenService};
use crate::routes;
use crate::store::{MemoryTaskStore, MemoryUserStore, TaskStore, UserStore};
use crate::tasks::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub gateway: web::Data<AuthGateway>,
    pub tasks: web::Data<TaskService>,
    /// Pre-shared key for the `/api` gate. No gate when `None`.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        tokens: TokenService,
        hasher: PasswordHasher,
        api_key: Option<String>,
    ) -> Self {
        let task_service = TaskService::new(tasks.clone(), users.clone());
        let gateway = AuthGateway::new(users, tasks, Arc::new(tokens), hasher);
        Self {
            gateway: web::Data::new(gateway),
            tasks: web::Data::new(task_service),
            api_key: api_key.map(Arc::from),
        }
    }

    /// State over fresh in-memory stores.
    pub fn in_memory(tokens: TokenService, hasher: PasswordHasher, api_key: Option<String>) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
            tokens,
            hasher,
            api_key,
        )
    }

    /// Registers shared data and every route. Pass to `App::configure`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        routes::config(cfg, self);
    }
}
