//! `PostgreSQL` binding for the pool's connector seam.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_postgres::{Client, NoTls};

use crate::error::QuizEngineError;
use crate::pool::{Connector, PooledConnection};

/// Connection settings for the game database.
#[derive(Debug, Clone, Deserialize)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl PgSettings {
    /// # Errors
    /// Returns [`QuizEngineError::ConfigError`] if a required field is empty.
    pub fn validate(&self) -> Result<(), QuizEngineError> {
        if self.host.is_empty() {
            return Err(QuizEngineError::ConfigError("host is required".to_string()));
        }
        if self.dbname.is_empty() {
            return Err(QuizEngineError::ConfigError(
                "dbname is required".to_string(),
            ));
        }
        if self.user.is_empty() {
            return Err(QuizEngineError::ConfigError("user is required".to_string()));
        }
        Ok(())
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

/// One pooled `PostgreSQL` connection: the client plus its driver task.
pub struct PgConnection {
    client: Client,
    driver: tokio::task::JoinHandle<()>,
}

impl PgConnection {
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl PooledConnection for PgConnection {
    fn is_valid(&self) -> bool {
        !self.client.is_closed()
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        // Dropping the client closes the socket; stop the driver task with it.
        self.driver.abort();
    }
}

/// Opens game-database connections for the pool producer.
#[derive(Debug, Clone)]
pub struct PgConnector {
    settings: PgSettings,
}

impl PgConnector {
    /// # Errors
    /// Returns [`QuizEngineError::ConfigError`] for incomplete settings.
    pub fn new(settings: PgSettings) -> Result<Self, QuizEngineError> {
        settings.validate()?;
        Ok(Self { settings })
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Conn = PgConnection;

    async fn connect(&self) -> Result<PgConnection, QuizEngineError> {
        let (client, connection) = self.settings.pg_config().connect(NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(error = %err, "postgres connection task ended with error");
            }
        });
        Ok(PgConnection { client, driver })
    }
}
