use serde::{Deserialize, Serialize};
use std::path::Path;
use time::UtcOffset;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KernelConfig {
    #[serde(default)]
    pub server: ServerConf,
    #[serde(default)]
    pub clock: ClockConf,
    #[serde(default = "default_recommender")]
    pub recommender: Option<RecommenderConf>, // null => recommandations désactivées
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerConf {
    pub bind: String, // ex: "0.0.0.0:8080"
}

/// Fuseau des libellés d'historique et des fenêtres d'activité journalières.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ClockConf {
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecommenderConf {
    pub endpoint: String,
    pub model: String,
    /// Variable d'environnement contenant la clé API ("" = pas de clé)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_recommender() -> Option<RecommenderConf> {
    Some(RecommenderConf::default())
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

impl Default for RecommenderConf {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.0-flash".into(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            server: ServerConf::default(),
            clock: ClockConf::default(),
            recommender: default_recommender(),
        }
    }
}

impl ClockConf {
    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_whole_seconds(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|e| {
            warn!("utc_offset_minutes={} invalide ({e}), usage UTC", self.utc_offset_minutes);
            UtcOffset::UTC
        })
    }
}

pub fn parse_config(txt: &str) -> Result<KernelConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("AEROGUARD_KERNEL_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        parse_config(&txt).unwrap_or_else(|e| {
            warn!("config invalide ({path}): {e}");
            KernelConfig::default()
        })
    } else {
        warn!("pas de {path}, usage config par défaut");
        KernelConfig::default()
    }
}
