use std::error::Error as _;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
    #[error("database url is not configured")]
    MissingDatabaseUrl,
    #[error("failed to connect to the database")]
    Connect(#[source] sqlx::Error),
    #[error("failed to run database migrations")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    /// Display text of this error followed by every source beneath it.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(err) = current {
            messages.push(err.to_string());
            current = err.source();
        }
        messages
    }
}
