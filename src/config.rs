// Configuration management module
// This file handles loading and parsing of configuration settings
// from environment variables

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::Deserialize;
use url::Url;

use crate::routes::registry::ChainTag;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Hex-encoded secp256k1 private key, with or without 0x (do not use in
    /// prod; replace with HSM)
    pub private_key: String,
    /// Xion bech32 account receiving length-prefixed transfers
    pub xion_address: String,
    /// Babylon bech32 account receiving length-prefixed transfers
    pub babylon_address: String,
    /// GraphQL indexer endpoint (optional; defaults to the public indexer)
    pub graphql_endpoint: Option<Url>,
    /// Per-chain RPC endpoint overrides (optional)
    pub sepolia_rpc: Option<Url>,
    pub holesky_rpc: Option<Url>,
    pub sei_rpc: Option<Url>,
    pub corn_rpc: Option<Url>,
    /// Per-chain transfer amount overrides in whole units (optional)
    pub sepolia_amount: Option<f64>,
    pub holesky_amount: Option<f64>,
    pub sei_amount: Option<f64>,
    pub corn_amount: Option<f64>,
    /// Inclusive bounds of the randomized delay between transfers, seconds
    pub min_delay: Option<u64>,
    pub max_delay: Option<u64>,
    /// Unattended mode: route ordinal 1-12, or 13 for every route
    pub route: Option<u8>,
    /// Transfers per route in unattended mode
    pub tx_count: Option<u32>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // APP__MIN_DELAY style keys: the APP prefix is stripped before the
        // remainder is matched against the fields above
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        let parsed: Self = cfg.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<()> {
        let (min, max) = self.delay_bounds();
        if min > max {
            bail!("APP__MIN_DELAY ({min}) exceeds APP__MAX_DELAY ({max})");
        }
        if let Some(count) = self.tx_count {
            if count == 0 {
                bail!("APP__TX_COUNT must be at least 1");
            }
        }
        Ok(())
    }

    pub fn delay_bounds(&self) -> (u64, u64) {
        (self.min_delay.unwrap_or(1), self.max_delay.unwrap_or(1))
    }

    pub fn rpc_overrides(&self) -> HashMap<ChainTag, String> {
        let pairs = [
            (ChainTag::Sepolia, &self.sepolia_rpc),
            (ChainTag::Holesky, &self.holesky_rpc),
            (ChainTag::Sei, &self.sei_rpc),
            (ChainTag::Corn, &self.corn_rpc),
        ];
        pairs
            .into_iter()
            .filter_map(|(tag, url)| url.as_ref().map(|u| (tag, u.to_string())))
            .collect()
    }

    pub fn amount_overrides(&self) -> HashMap<ChainTag, f64> {
        let pairs = [
            (ChainTag::Sepolia, self.sepolia_amount),
            (ChainTag::Holesky, self.holesky_amount),
            (ChainTag::Sei, self.sei_amount),
            (ChainTag::Corn, self.corn_amount),
        ];
        pairs
            .into_iter()
            .filter_map(|(tag, amount)| amount.map(|a| (tag, a)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            private_key: "0x01".into(),
            xion_address: "xion1test".into(),
            babylon_address: "bbn1test".into(),
            graphql_endpoint: None,
            sepolia_rpc: None,
            holesky_rpc: None,
            sei_rpc: None,
            corn_rpc: None,
            sepolia_amount: None,
            holesky_amount: None,
            sei_amount: None,
            corn_amount: None,
            min_delay: None,
            max_delay: None,
            route: None,
            tx_count: None,
        }
    }

    #[test]
    fn delay_bounds_default_to_one_second() {
        assert_eq!(base_config().delay_bounds(), (1, 1));
    }

    #[test]
    fn inverted_delay_bounds_are_rejected() {
        let mut cfg = base_config();
        cfg.min_delay = Some(10);
        cfg.max_delay = Some(2);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn app_prefixed_environment_variables_are_read() {
        std::env::set_var("APP__PRIVATE_KEY", "0x01");
        std::env::set_var("APP__XION_ADDRESS", "xion1test");
        std::env::set_var("APP__BABYLON_ADDRESS", "bbn1test");
        std::env::set_var("APP__MIN_DELAY", "2");
        std::env::set_var("APP__MAX_DELAY", "3");

        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.private_key, "0x01");
        assert_eq!(cfg.xion_address, "xion1test");
        assert_eq!(cfg.babylon_address, "bbn1test");
        assert_eq!(cfg.delay_bounds(), (2, 3));

        for key in [
            "APP__PRIVATE_KEY",
            "APP__XION_ADDRESS",
            "APP__BABYLON_ADDRESS",
            "APP__MIN_DELAY",
            "APP__MAX_DELAY",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn overrides_only_cover_configured_chains() {
        let mut cfg = base_config();
        cfg.sei_amount = Some(0.5);
        cfg.holesky_rpc = Some("http://localhost:8545".parse().unwrap());

        let amounts = cfg.amount_overrides();
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[&ChainTag::Sei], 0.5);

        let rpcs = cfg.rpc_overrides();
        assert_eq!(rpcs.len(), 1);
        assert!(rpcs[&ChainTag::Holesky].starts_with("http://localhost"));
    }
}
