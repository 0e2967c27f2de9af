/// Factory: build `Authenticator` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::oauth::{Authenticator, HttpTokenResolver};

pub fn build_authenticator(config: &Config) -> Result<Arc<Authenticator>, AppError> {
    let resolver = HttpTokenResolver::new(&config.oauth)
        .map_err(|e| AppError::internal("could not build oauth http client", e))?;

    Ok(Arc::new(Authenticator::new(Arc::new(resolver))))
}
