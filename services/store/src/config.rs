/// Store service configuration loaded from environment variables.
#[derive(Debug)]
pub struct StoreConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing and validating session JWTs.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// TCP port for the HTTP server (default 3111). Env var: `STORE_PORT`.
    pub store_port: u16,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            store_port: std::env::var("STORE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3111),
        }
    }
}
