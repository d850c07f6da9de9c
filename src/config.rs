use anyhow::{anyhow, bail, Context};
use std::net::SocketAddr;
use std::str::FromStr;

use crate::store::RecordCollection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingMode {
    Live,
    Simulated,
}

impl TradingMode {
    pub fn collection(&self) -> RecordCollection {
        match self {
            TradingMode::Live => RecordCollection::Live,
            TradingMode::Simulated => RecordCollection::Simulated,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, TradingMode::Live)
    }
}

impl FromStr for TradingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(TradingMode::Live),
            "simulated" | "test" => Ok(TradingMode::Simulated),
            other => Err(anyhow!("Invalid TRADING_MODE: {}. Must be 'live' or 'simulated'", other)),
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Simulated => write!(f, "simulated"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradingConfig {
    pub mode: TradingMode,
    /// Funds assumed available in simulated mode.
    pub simulated_balance: f64,
    /// Kept back from the live broker balance on every buy.
    pub safety_margin: f64,
    /// Above this (after the margin) only half of the balance is deployed.
    pub large_balance_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    pub url: String,
    pub table_id: String,
    pub security_master_path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct DhanConfig {
    pub client_id: Option<String>,
    pub access_token: Option<String>,
    pub base_url: String,
}

/// Cron expressions (`sec min hour dom mon dow`), read in Asia/Kolkata.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub scan_cron: String,
    pub buy_cron: String,
    pub sell_cron: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub bind_addr: SocketAddr,
    pub client_urls: Vec<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub trading: TradingConfig,
    pub screener: ScreenerConfig,
    pub dhan: DhanConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = or("BIND_ADDR", "0.0.0.0:8000")
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let client_urls = var("CLIENT_URL")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let trading = TradingConfig {
            mode: or("TRADING_MODE", "simulated").parse()?,
            simulated_balance: parse_var(&var, "SIMULATED_BALANCE", 50_000.0)?,
            safety_margin: parse_var(&var, "BALANCE_SAFETY_MARGIN", 500.0)?,
            large_balance_threshold: parse_var(&var, "LARGE_BALANCE_THRESHOLD", 80_000.0)?,
        };

        let screener = ScreenerConfig {
            url: or("SCREENER_URL", "https://chartink.com/screener/rsi-greater-than-60-5109"),
            table_id: or("SCREENER_TABLE_ID", "DataTables_Table_0"),
            security_master_path: or("SECURITY_MASTER_PATH", "api_scrip_master.json"),
            timeout_secs: parse_var(&var, "SCRAPER_TIMEOUT_SECS", 30)?,
            user_agent: or(
                "SCRAPER_USER_AGENT",
                "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
            ),
        };

        let dhan = DhanConfig {
            client_id: var("DHAN_CLIENT_ID").filter(|s| !s.is_empty()),
            access_token: var("DHAN_ACCESS_TOKEN").filter(|s| !s.is_empty()),
            base_url: or("DHAN_BASE_URL", "https://api.dhan.co/v2"),
        };

        let scheduler = SchedulerConfig {
            scan_cron: or("SCAN_CRON", "0 59 23 * * *"),
            buy_cron: or("BUY_CRON", "5 16 15 * * Mon-Fri"),
            sell_cron: or("SELL_CRON", "5 16 9 * * Mon-Fri"),
        };

        let config = Self {
            app_name: or("APP_NAME", "stockfolio"),
            bind_addr,
            client_urls,
            database_url,
            database_max_connections: parse_var(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            trading,
            screener,
            dhan,
            scheduler,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.trading.simulated_balance < 0.0 || self.trading.safety_margin < 0.0 {
            bail!("SIMULATED_BALANCE and BALANCE_SAFETY_MARGIN must not be negative");
        }
        if self.database_max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
