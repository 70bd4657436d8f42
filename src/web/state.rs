use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{mailer::MailClient, web::messages::MessageLog};

const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MESSAGE_LOG: &str = "messages.txt";

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    mail: MailClient,
    upload_dir: PathBuf,
    message_log: MessageLog,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let mail = MailClient::from_env().context("failed to initialize mail client")?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let upload_dir = PathBuf::from(
            env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string()),
        );
        tokio::fs::create_dir_all(&upload_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create upload directory at {}",
                    upload_dir.display()
                )
            })?;

        let message_log_path =
            env::var("MESSAGE_LOG_PATH").unwrap_or_else(|_| DEFAULT_MESSAGE_LOG.to_string());
        let message_log = MessageLog::new(message_log_path);

        Ok(Self {
            pool,
            mail,
            upload_dir,
            message_log,
        })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn mail(&self) -> &MailClient {
        &self.mail
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn message_log(&self) -> &MessageLog {
        &self.message_log
    }
}
