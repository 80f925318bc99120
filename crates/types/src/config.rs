//! Node configuration (spec.md §6): the options recognized when loading the
//! well-known configuration file from a node's base directory.

use serde::{Deserialize, Serialize};

/// The signature scheme used to verify non-initial, non-view requests.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub enum SignatureScheme {
    #[default]
    Ed25519,
    Ed25519Det,
    Sha256Dsa,
    Qtesla1,
    Qtesla3,
    /// Accepts every signature; intended for tests and dev faucets only.
    Empty,
}

/// The full set of options recognized in the node's configuration file
/// (spec.md §6 table). Unset fields fall back to the documented defaults.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Node base directory; `<dir>/store` and `<dir>/<engine>` hang off it.
    pub dir: String,

    #[serde(default = "defaults::max_gas_per_view_transaction")]
    pub max_gas_per_view_transaction: u128,
    #[serde(default = "defaults::max_polling_attempts")]
    pub max_polling_attempts: u32,
    #[serde(default = "defaults::polling_delay_millis")]
    pub polling_delay_millis: u64,

    #[serde(default)]
    pub signature_for_requests: SignatureScheme,
    #[serde(default)]
    pub allow_unsigned_faucet: bool,
    #[serde(default)]
    pub ignore_gas_price: bool,

    #[serde(default = "defaults::initial_supply")]
    pub initial_supply: u128,
    #[serde(default = "defaults::final_supply")]
    pub final_supply: u128,
    #[serde(default)]
    pub initial_red_supply: u128,
    /// Scaled by 10^8, per spec.md §6.
    #[serde(default)]
    pub initial_inflation: u64,

    #[serde(default = "defaults::initial_gas_price")]
    pub initial_gas_price: u128,
    #[serde(default = "defaults::target_gas_at_reward")]
    pub target_gas_at_reward: u128,
    #[serde(default = "defaults::oblivion")]
    pub oblivion: u64,

    #[serde(default = "defaults::max_error_length")]
    pub max_error_length: usize,
    #[serde(default = "defaults::max_dependencies")]
    pub max_dependencies: usize,
    #[serde(default = "defaults::max_cumulative_size_of_dependencies")]
    pub max_cumulative_size_of_dependencies: u64,

    #[serde(default = "defaults::ticket_for_new_poll")]
    pub ticket_for_new_poll: u128,
    #[serde(default = "defaults::percent_staked")]
    pub percent_staked: u32,
    #[serde(default)]
    pub buyer_surcharge: u32,
    #[serde(default = "defaults::slashing_for_misbehaving")]
    pub slashing_for_misbehaving: u32,
    #[serde(default = "defaults::slashing_for_not_behaving")]
    pub slashing_for_not_behaving: u32,

    pub chain_id: String,
    pub genesis_time: u64,

    #[serde(default = "defaults::verification_version")]
    pub verification_version: u32,
}

impl NodeConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

mod defaults {
    pub fn max_gas_per_view_transaction() -> u128 {
        100_000_000
    }
    pub fn max_polling_attempts() -> u32 {
        60
    }
    pub fn polling_delay_millis() -> u64 {
        1_000
    }
    pub fn initial_supply() -> u128 {
        1_000_000_000_000_000_000_000
    }
    pub fn final_supply() -> u128 {
        2_000_000_000_000_000_000_000
    }
    pub fn initial_gas_price() -> u128 {
        1
    }
    pub fn target_gas_at_reward() -> u128 {
        1_000_000
    }
    pub fn oblivion() -> u64 {
        250_000
    }
    pub fn max_error_length() -> usize {
        300
    }
    pub fn max_dependencies() -> usize {
        20
    }
    pub fn max_cumulative_size_of_dependencies() -> u64 {
        10_000_000
    }
    pub fn ticket_for_new_poll() -> u128 {
        100
    }
    pub fn percent_staked() -> u32 {
        75
    }
    pub fn slashing_for_misbehaving() -> u32 {
        1
    }
    pub fn slashing_for_not_behaving() -> u32 {
        1
    }
    pub fn verification_version() -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_in_defaults() {
        let toml = r#"
            dir = "/var/lib/jarnet"
            chainId = "test"
            genesisTime = 0
        "#;
        let cfg = NodeConfig::from_toml_str(toml).expect("parse");
        assert_eq!(cfg.dir, "/var/lib/jarnet");
        assert_eq!(cfg.max_dependencies, 20);
        assert_eq!(cfg.signature_for_requests, SignatureScheme::Ed25519);
    }

    #[test]
    fn overrides_apply() {
        let toml = r#"
            dir = "/var/lib/jarnet"
            chainId = "test"
            genesisTime = 0
            maxDependencies = 5
            signatureForRequests = "empty"
            ignoreGasPrice = true
        "#;
        let cfg = NodeConfig::from_toml_str(toml).expect("parse");
        assert_eq!(cfg.max_dependencies, 5);
        assert_eq!(cfg.signature_for_requests, SignatureScheme::Empty);
        assert!(cfg.ignore_gas_price);
    }
}
