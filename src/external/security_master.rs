use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct MasterEntry {
    #[serde(rename = "SEM_TRADING_SYMBOL")]
    trading_symbol: Option<String>,
    #[serde(rename = "SEM_SMST_SECURITY_ID")]
    security_id: Option<Value>,
}

/// Broker's scrip master: trading symbol → security id.
#[derive(Debug, Clone, Default)]
pub struct SecurityMaster {
    ids: HashMap<String, String>,
}

impl SecurityMaster {
    /// Loads the master from a JSON array. A missing or unreadable file
    /// gives an empty master, so every lookup misses.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Security master {} not loaded: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&raw) {
            Ok(master) => {
                info!("Loaded {} securities from {}", master.len(), path.display());
                master
            }
            Err(e) => {
                warn!("Security master {} is not valid JSON: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<MasterEntry> = serde_json::from_str(raw)?;
        Ok(Self::from_entries(entries))
    }

    fn from_entries(entries: Vec<MasterEntry>) -> Self {
        let mut ids = HashMap::with_capacity(entries.len());
        for entry in entries {
            let (Some(symbol), Some(id)) = (entry.trading_symbol, entry.security_id) else {
                continue;
            };
            let id = match id {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            // First listing of a symbol wins.
            ids.entry(symbol).or_insert(id);
        }
        Self { ids }
    }

    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        self.ids.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
