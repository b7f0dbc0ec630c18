use std::env;

#[derive(Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub admin_username: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(38400);

        let sqlite_path =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "/opt/staffdesk/data.sqlite".to_string());
        let database_url = env::var("DATABASE_URL").ok();

        let session_secret = env::var("SESSION_SECRET")
            .unwrap_or_else(|_| "kQ3vN8dWgPbTxRz2mJfA".to_string());

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(12);

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

        Self {
            server_port,
            sqlite_path,
            database_url,
            session_secret,
            session_ttl_hours,
            admin_username,
            admin_password,
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}", path)
    }
}
