use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: i64 = 10 * 1024 * 1024;

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub max_upload_bytes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| AppError::configuration("DATABASE_URL not set"))?;

        let port = std::env::var("APP_PORT")
            .map(|val| val.parse::<u16>())
            .unwrap_or(Ok(DEFAULT_PORT))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        Ok(Self {
            database_url,
            port,
            max_upload_bytes: max_upload_bytes_from_env()?,
        })
    }
}

/// Upload ceiling shared by the server and by `create_app`, which only gets a pool.
pub fn max_upload_bytes_from_env() -> Result<i64, AppError> {
    let value = std::env::var("MAX_UPLOAD_BYTES")
        .map(|val| val.parse::<i64>())
        .unwrap_or(Ok(DEFAULT_MAX_UPLOAD_BYTES))
        .map_err(|_| AppError::configuration("MAX_UPLOAD_BYTES must be a valid integer"))?;

    if value <= 0 {
        return Err(AppError::configuration("MAX_UPLOAD_BYTES must be positive"));
    }

    Ok(value)
}

/// Loads `.env` from the working directory, falling back to the crate root.
pub fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}
