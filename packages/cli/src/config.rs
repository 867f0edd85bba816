use domsync_dom::{ClientProfile, RenderConfig, RenderSession, ScriptOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "domsync.config.json";

/// Domsync configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the batch descriptions (`*.json`)
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// The client the output is rendered for
    #[serde(default)]
    pub client: ClientProfile,

    /// Names of the client runtime objects
    #[serde(default)]
    pub runtime: RenderConfig,

    /// Collapse single display changes into helper calls
    #[serde(default = "default_fast_path")]
    pub fast_path: bool,

    /// Optional output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
}

fn default_input_dir() -> String {
    "mutations".to_string()
}

fn default_fast_path() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_input_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.input_dir)
    }

    /// A fresh session for one file
    pub fn session(&self) -> RenderSession {
        RenderSession::new(self.runtime.clone(), self.client.clone()).with_options(ScriptOptions {
            fast_path: self.fast_path,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            client: ClientProfile::default(),
            runtime: RenderConfig::default(),
            fast_path: default_fast_path(),
            out_dir: None,
        }
    }
}
