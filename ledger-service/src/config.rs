use std::{fs, path::PathBuf};

use ledger_client::domain::{Period, Role};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URI, e.g. `sqlite://energy.db`.
    pub uri: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportConfig {
    /// Directory holding `Buildings.csv`, `Units.csv` and `Usage.csv`,
    /// imported at startup when set.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub year: i32,
    pub month: u32,
}

impl ReportConfig {
    pub fn period(&self) -> anyhow::Result<Period> {
        Ok(Period::new(self.year, self.month)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("LEDGER_CONFIG").unwrap_or_else(|_| "ledger-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.report.period()?;
        Ok(cfg)
    }
}
