//! Configuration for taskboard
//!
//! Loaded from a TOML file; every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One day, the grace window after a subscription period ends
pub const DAY_IN_MS: i64 = 86_400_000;

/// Boards an unsubscribed organization may create
pub const MAX_FREE_BOARDS: u32 = 5;

/// taskboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the JSONL collections. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,

    /// Free-tier board cap per organization
    pub max_free_boards: u32,

    /// Milliseconds a subscription stays valid after its period end
    pub subscription_grace_ms: i64,

    /// Payment provider settings
    #[serde(default)]
    pub billing: BillingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_free_boards: MAX_FREE_BOARDS,
            subscription_grace_ms: DAY_IN_MS,
            billing: BillingConfig::default(),
        }
    }
}

/// Payment provider configuration
///
/// Secrets (API key, webhook secret) are not read from the file; the server
/// takes them from its environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Base URL of the payment provider REST API
    pub api_base: String,

    /// Frontend URL used for checkout return links
    pub client_url: String,

    /// ISO currency code of the subscription price
    pub currency: String,

    /// Price per interval in the currency's minor unit
    pub unit_amount: u64,

    /// Billing interval (day, week, month, year)
    pub interval: String,

    pub product_name: String,

    pub product_description: String,

    /// Accepted clock skew for webhook signatures, in seconds
    pub webhook_tolerance_secs: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.stripe.com".to_string(),
            client_url: "http://localhost:3000".to_string(),
            currency: "usd".to_string(),
            unit_amount: 2000,
            interval: "month".to_string(),
            product_name: "Taskboard Premium".to_string(),
            product_description: "Unlimited boards for your organization".to_string(),
            webhook_tolerance_secs: 300,
        }
    }
}

impl BillingConfig {
    /// Page the payment provider sends the user back to
    pub fn organization_url(&self, org_id: &str) -> String {
        format!(
            "{}/organization/{}",
            self.client_url.trim_end_matches('/'),
            org_id
        )
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default location for persisted data (`$XDG_DATA_HOME/taskboard`)
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("taskboard"))
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# taskboard configuration

# Directory for the JSONL collections; omit to keep data in memory
# data_dir = "/var/lib/taskboard"

# Boards an organization may create without a subscription
max_free_boards = 5

# Grace window after a subscription period ends (milliseconds)
subscription_grace_ms = 86400000

[billing]
api_base = "https://api.stripe.com"

# Checkout and billing portal return here: {client_url}/organization/{orgId}
client_url = "http://localhost:3000"

currency = "usd"
unit_amount = 2000
interval = "month"
product_name = "Taskboard Premium"
product_description = "Unlimited boards for your organization"

# Accepted clock skew for webhook signatures (seconds)
webhook_tolerance_secs = 300
"#
        .to_string()
    }
}
