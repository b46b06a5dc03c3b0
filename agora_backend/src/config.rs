use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AgoraConfig {
    pub api_port: u16,
    pub paths: AgoraPaths,
    pub http: HttpConfig,
}

impl AgoraConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match env::var("AGORA_BASE_DIR") {
            Ok(raw) if !raw.trim().is_empty() => AgoraPaths::from_base_dir(raw.trim())?,
            _ => AgoraPaths::discover()?,
        };
        let api_port = env::var("AGORA_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);
        Ok(Self {
            api_port,
            paths,
            http: HttpConfig::from_env(),
        })
    }

    pub fn new(api_port: u16, paths: AgoraPaths) -> Self {
        Self {
            api_port,
            paths,
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl HttpConfig {
    pub fn from_env() -> Self {
        let max_body_bytes = env::var("AGORA_MAX_BODY_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        Self { max_body_bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgoraPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl AgoraPaths {
    /// Lays the data directories out next to the running executable.
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("agora.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}
