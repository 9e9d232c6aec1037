use config::{Config, ConfigError, File};
use extractors::ExtractorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AgentCommConfig {
    pub extractor: ExtractorConfig,
    pub delegation: DelegationConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DelegationConfig {
    pub from_agent: String,
    pub to_agent: String,
    pub scopes: Vec<String>,
    pub token_ttl_hours: i64,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            from_agent: "Email Intelligence Agent (Agent A)".to_string(),
            to_agent: "Calendar Management Agent (Agent B)".to_string(),
            scopes: vec![
                "calendar:write".to_string(),
                "events:create".to_string(),
                "attendees:invite".to_string(),
            ],
            token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

const DEFAULT_CONFIG: &str = r#"
[extractor.keywords]
# Each list replaces the built-in list of the same name
# event = ["meeting", "appointment", "call"]
# high_priority = ["urgent", "asap"]
# medium_priority = ["important", "deadline"]
# action = ["respond", "reply", "confirm"]
# confirmation = ["confirmed", "booked"]
# negation = ["tentative", "maybe"]

# Replace the pattern list of one field (sender, subject, event_title, date,
# time, location, attendee_names, description)
# [[extractor.patterns.location]]
# name = "office_room"
# regex = "(?i)office\\s+(\\w+)"
# group = 1

[delegation]
from_agent = "Email Intelligence Agent (Agent A)"
to_agent = "Calendar Management Agent (Agent B)"
scopes = ["calendar:write", "events:create", "attendees:invite"]
token_ttl_hours = 24

[database]
# path = "/path/to/agentcomm.sqlite"
"#;

impl AgentCommConfig {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Load the file at `config_path`, writing a default one first if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            std::fs::write(config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default config to {:?}", config_path);
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .build()?;

        builder.try_deserialize()
    }

    pub fn resolve_db_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.database.path.as_ref() {
            return Ok(PathBuf::from(path));
        }

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
        Ok(data_dir.join("agentcomm").join("db.sqlite"))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("agentcomm").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}
