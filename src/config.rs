use std::env;

const LOCAL_JWT_SECRET: &str = "lab-cms-local-development-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_GALLERY_BUCKET: &str = "lab-gallery";

/// Env
///
/// Runtime context. `Local` enables the development conveniences (in-memory store,
/// `x-user-role` bypass, MinIO, pretty logs). `Production` demands real infrastructure.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// `APP_ENV=production` selects production; anything else is local.
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        }
    }
}

/// StorageConfig
///
/// Connection details of the S3-compatible bucket holding gallery images.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

impl StorageConfig {
    /// The MinIO container used in local development.
    pub fn minio(bucket: impl Into<String>) -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            region: "us-east-1".to_string(),
            access_key: "admin".to_string(),
            secret_key: "password".to_string(),
            bucket: bucket.into(),
        }
    }

    /// The S3 gateway of a Supabase project. Its region is not checked.
    pub fn supabase(project_url: &str, access_key: String, secret_key: String, bucket: String) -> Self {
        Self {
            endpoint: format!("{}/storage/v1/s3", project_url.trim_end_matches('/')),
            region: "stub".to_string(),
            access_key,
            secret_key,
            bucket,
        }
    }
}

/// AppConfig
///
/// Everything the server reads from its environment, loaded once at startup and shared
/// with extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub env: Env,
    pub bind_addr: String,
    /// Postgres URL. `None` (local only) selects the in-memory store.
    pub db_url: Option<String>,
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: String,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    /// Local configuration for tests: in-memory store, ephemeral port, known secret.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            storage: StorageConfig::minio("lab-gallery-test"),
        }
    }
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("FATAL: {name} must be set in production."))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (after `dotenv`).
    ///
    /// # Panics
    /// In `Env::Production`, when `AUTH_JWT_SECRET`, `DATABASE_URL`, `SUPABASE_URL`,
    /// `S3_ACCESS_KEY` or `S3_SECRET_KEY` is missing.
    pub fn load() -> Self {
        let env = Env::from_env();
        let bind_addr = optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bucket =
            optional("GALLERY_BUCKET").unwrap_or_else(|| DEFAULT_GALLERY_BUCKET.to_string());

        match env {
            Env::Local => Self {
                env,
                bind_addr,
                db_url: optional("DATABASE_URL"),
                jwt_secret: optional("AUTH_JWT_SECRET")
                    .unwrap_or_else(|| LOCAL_JWT_SECRET.to_string()),
                storage: StorageConfig::minio(bucket),
            },
            Env::Production => Self {
                env,
                bind_addr,
                db_url: Some(required("DATABASE_URL")),
                jwt_secret: required("AUTH_JWT_SECRET"),
                storage: StorageConfig::supabase(
                    &required("SUPABASE_URL"),
                    required("S3_ACCESS_KEY"),
                    required("S3_SECRET_KEY"),
                    bucket,
                ),
            },
        }
    }
}
