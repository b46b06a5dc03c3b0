use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_SIGNIN_PATH: &str = "/auth/signin";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Path of the external sign-in page that receives `callbackUrl`.
    pub signin_path: String,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            signin_path: DEFAULT_SIGNIN_PATH.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_url = non_empty_var("AGORA_API_URL").unwrap_or(defaults.api_url);
        let signin_path = non_empty_var("AGORA_SIGNIN_PATH").unwrap_or(defaults.signin_path);
        let http_timeout = non_empty_var("AGORA_HTTP_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);
        Self {
            api_url,
            signin_path,
            http_timeout,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
