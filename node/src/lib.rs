use commonware_codec::DecodeExt;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_utils::{from_hex_formatted, hex};
use rpsledger_execution::LedgerConfig;
use rpsledger_types::ledger::{
    LedgerError, Tier, TierRegistry, DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_TIER_AMOUNT,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    num::{NonZeroU64, NonZeroUsize},
    str::FromStr,
};
use thiserror::Error;
use tracing::Level;

pub mod defaults;
pub mod simulator;

#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    pub fn from_hex_formatted(value: &str) -> Option<Self> {
        from_hex_formatted(value).map(Self)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Stake amounts replacing the built-in tier table. Unset tiers keep their default.
pub type TierOverrides = BTreeMap<Tier, u64>;

fn apply_overrides(overrides: &TierOverrides) -> TierRegistry {
    let mut tiers = TierRegistry::default();
    for (tier, amount) in overrides {
        tiers.set(*tier, *amount);
    }
    tiers
}

/// Knobs of the `ledger-sim` block simulator.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub players: usize,
    pub rounds: u64,
    pub seed: u64,
    pub funding: u64,
    pub bankroll: u64,
    pub start_timestamp: u64,
    pub block_interval_secs: u64,
    pub admin_interval: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            players: defaults::DEFAULT_PLAYERS,
            rounds: defaults::DEFAULT_ROUNDS,
            seed: defaults::DEFAULT_SEED,
            funding: defaults::DEFAULT_FUNDING,
            bankroll: defaults::DEFAULT_BANKROLL,
            start_timestamp: defaults::DEFAULT_START_TIMESTAMP,
            block_interval_secs: defaults::DEFAULT_BLOCK_INTERVAL_SECS,
            admin_interval: defaults::DEFAULT_ADMIN_INTERVAL,
        }
    }
}

/// Configuration for a ledger instance and the [simulator::Simulation] driving it.
#[derive(Deserialize, Serialize)]
pub struct Config {
    /// Administrator signing key. The ledger's admin identity is its public key.
    pub private_key: HexBytes,
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_max_tier_amount")]
    pub max_tier_amount: u64,
    #[serde(default)]
    pub tiers: TierOverrides,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("ledger config rejected: {source}")]
    InvalidLedger {
        #[source]
        source: LedgerError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    pub players: NonZeroUsize,
    pub rounds: NonZeroU64,
    pub seed: u64,
    pub funding: u64,
    pub bankroll: u64,
    pub start_timestamp: u64,
    pub block_interval_secs: NonZeroU64,
    pub admin_interval: NonZeroU64,
}

pub struct ValidatedConfig {
    pub signer: PrivateKey,
    pub admin: PublicKey,
    pub log_level: Level,
    pub json_logs: bool,
    pub ledger: LedgerConfig,
    pub simulation: SimulationConfig,
}

struct RedactedConfig<'a>(&'a Config);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        f.debug_struct("Config")
            .field("private_key", &"<redacted>")
            .field("log_level", &cfg.log_level)
            .field("json_logs", &cfg.json_logs)
            .field("cooldown_secs", &cfg.cooldown_secs)
            .field("max_tier_amount", &cfg.max_tier_amount)
            .field("tiers", &cfg.tiers)
            .field("simulation", &cfg.simulation)
            .finish()
    }
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_max_tier_amount() -> u64 {
    DEFAULT_MAX_TIER_AMOUNT
}

fn decode_secret<T: DecodeExt<()>>(field: &'static str, value: &HexBytes) -> Result<T, ConfigError> {
    T::decode(value.as_ref()).map_err(|source| ConfigError::InvalidDecode {
        field,
        value: "<redacted>".to_string(),
        source,
    })
}

fn nonzero_usize(field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::InvalidNonZero { field, value: 0 })
}

fn nonzero_u64(field: &'static str, value: u64) -> Result<NonZeroU64, ConfigError> {
    NonZeroU64::new(value).ok_or(ConfigError::InvalidNonZero { field, value: 0 })
}

pub fn parse_public_key(value: &str) -> Option<PublicKey> {
    from_hex_formatted(value).and_then(|key| PublicKey::decode(key.as_ref()).ok())
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<SimulationConfig, ConfigError> {
        Ok(SimulationConfig {
            players: nonzero_usize("simulation.players", self.players)?,
            rounds: nonzero_u64("simulation.rounds", self.rounds)?,
            seed: self.seed,
            funding: self.funding,
            bankroll: self.bankroll,
            start_timestamp: self.start_timestamp,
            block_interval_secs: nonzero_u64(
                "simulation.block_interval_secs",
                self.block_interval_secs,
            )?,
            admin_interval: nonzero_u64("simulation.admin_interval", self.admin_interval)?,
        })
    }
}

impl Config {
    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }

    pub fn parse_signer(&self) -> Result<PrivateKey, ConfigError> {
        decode_secret("private_key", &self.private_key)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let signer = self.parse_signer()?;
        let admin = signer.public_key();

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        let ledger = LedgerConfig {
            admin: admin.clone(),
            cooldown_secs: self.cooldown_secs,
            max_tier_amount: self.max_tier_amount,
            tiers: apply_overrides(&self.tiers),
        };
        ledger
            .validate()
            .map_err(|source| ConfigError::InvalidLedger { source })?;

        let simulation = self.simulation.validate()?;

        Ok(ValidatedConfig {
            signer,
            admin,
            log_level,
            json_logs: self.json_logs,
            ledger,
            simulation,
        })
    }
}
