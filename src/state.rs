use std::{sync::Arc, time::Instant};

use crate::{
    auth::{PasswordHasher, TokenService},
    config::Config,
    db::Store,
    mail::Mailer,
};

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub mailer: Arc<dyn Mailer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret),
            passwords: PasswordHasher::new(config.bcrypt_cost),
            config: Arc::new(config),
            store,
            mailer,
            started_at: Instant::now(),
        }
    }
}
