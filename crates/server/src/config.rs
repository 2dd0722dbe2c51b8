use std::env;

/// Server configuration, read once at startup. Nothing below the transport
/// boundary touches the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub redis_url: Option<String>,
    pub allow_in_memory_room_store: bool,
    pub database_url: Option<String>,
    pub enable_db_persistence: bool,
    pub cors_origins: Vec<String>,
    pub production: bool,
    pub log_dir: Option<String>,
}

fn truthy(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase),
        Some(ref v) if matches!(v.as_str(), "1" | "true" | "yes" | "on")
    )
}

impl ServerConfig {
    /// Reads and validates the environment:
    ///
    /// - `PORT` (default 8080)
    /// - `REDIS_URL`, or `ALLOW_IN_MEMORY_ROOM_STORE=true` to opt into the
    ///   single-process fallback
    /// - `ENABLE_DB_PERSISTENCE` with a required `DATABASE_URL`
    /// - `CORS_ORIGINS` comma-separated; required in production
    ///   (`APP_ENV=production`) and never `*`
    /// - `LOG_DIR` to additionally write DEBUG logs to timestamped files
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse()?,
            Err(_) => 8080,
        };
        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty());
        let allow_in_memory_room_store = truthy(env::var("ALLOW_IN_MEMORY_ROOM_STORE").ok());
        let enable_db_persistence = truthy(env::var("ENABLE_DB_PERSISTENCE").ok());
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        let production = env::var("APP_ENV")
            .map(|v| v.trim().eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let log_dir = env::var("LOG_DIR").ok().filter(|s| !s.trim().is_empty());

        let config = Self {
            port,
            redis_url,
            allow_in_memory_room_store,
            database_url,
            enable_db_persistence,
            cors_origins,
            production,
            log_dir,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.redis_url.is_none() && !self.allow_in_memory_room_store {
            anyhow::bail!(
                "no REDIS_URL configured; set ALLOW_IN_MEMORY_ROOM_STORE=true to run single-process"
            );
        }
        if self.enable_db_persistence && self.database_url.is_none() {
            anyhow::bail!("ENABLE_DB_PERSISTENCE requires DATABASE_URL");
        }
        if self.cors_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ORIGINS must list explicit origins, never *");
        }
        if self.production && self.cors_origins.is_empty() {
            anyhow::bail!("CORS_ORIGINS is required in production");
        }
        Ok(())
    }
}
