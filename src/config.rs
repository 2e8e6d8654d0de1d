use crate::{consts, errors::ConfigError};
use alloy::{primitives::Address, transports::http::reqwest::Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RPC_URL_VAR: &str = "ENS_NFT_RPC_URL";
pub const REGISTRY_VAR: &str = "ENS_NFT_REGISTRY";
/// JSON object of chain id to resolver address, e.g. `{"1337": "0x..."}`
pub const RESOLVERS_VAR: &str = "ENS_NFT_RESOLVERS";

/// ERC-2381 resolver deployments by chain id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NftResolverTable(BTreeMap<u64, Address>);

impl Default for NftResolverTable {
    fn default() -> Self {
        Self(consts::NFT_RESOLVERS.iter().copied().collect())
    }
}

impl NftResolverTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with_resolver(mut self, chain_id: u64, resolver: Address) -> Self {
        self.0.insert(chain_id, resolver);
        self
    }

    pub fn resolver_for(&self, chain_id: u64) -> Option<Address> {
        self.0.get(&chain_id).copied()
    }

    /// Entries of `other` win.
    pub fn merge(mut self, other: NftResolverTable) -> Self {
        self.0.extend(other.0);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: Url,
    pub registry_address: Address,
    pub nft_resolvers: NftResolverTable,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key-value source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup(RPC_URL_VAR)
            .unwrap_or_else(|| consts::DEFAULT_ETHEREUM_RPC_URL.to_string())
            .parse::<Url>()
            .map_err(|e| ConfigError::Url {
                name: RPC_URL_VAR,
                reason: e.to_string(),
            })?;

        let registry_address = match lookup(REGISTRY_VAR) {
            Some(registry) => {
                registry
                    .trim()
                    .parse::<Address>()
                    .map_err(|e| ConfigError::Address {
                        name: REGISTRY_VAR,
                        reason: e.to_string(),
                    })?
            }
            None => consts::MAINNET_ENS_ADDRESS,
        };

        let mut nft_resolvers = NftResolverTable::default();
        if let Some(resolvers) = lookup(RESOLVERS_VAR) {
            let overrides: NftResolverTable =
                serde_json::from_str(&resolvers).map_err(|source| ConfigError::ResolverTable {
                    name: RESOLVERS_VAR,
                    source,
                })?;
            nft_resolvers = nft_resolvers.merge(overrides);
        }

        tracing::debug!(%rpc_url, registry = %registry_address, "config loaded");
        Ok(Config {
            rpc_url,
            registry_address,
            nft_resolvers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.rpc_url.as_str(), "https://ethereum-rpc.publicnode.com/");
        assert_eq!(config.registry_address, consts::MAINNET_ENS_ADDRESS);
        assert_eq!(config.nft_resolvers, NftResolverTable::default());
    }

    #[test]
    fn resolver_overrides_are_merged() {
        let local = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let config = Config::from_lookup(lookup(&[
            (RPC_URL_VAR, "http://localhost:8545"),
            (
                RESOLVERS_VAR,
                r#"{"31337": "0x5FbDB2315678afecb367f032d93F642f64180aa3"}"#,
            ),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url.as_str(), "http://localhost:8545/");
        assert_eq!(config.nft_resolvers.resolver_for(31337), Some(local));
        assert!(config.nft_resolvers.resolver_for(1).is_some());
    }

    #[test]
    fn built_in_resolvers_can_be_replaced() {
        let deployed = address!("00000000000000000000000000000000000000e5");
        let config = Config::from_lookup(lookup(&[(
            RESOLVERS_VAR,
            r#"{"1": "0x00000000000000000000000000000000000000e5"}"#,
        )]))
        .unwrap();
        assert_eq!(config.nft_resolvers.resolver_for(1), Some(deployed));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = Config::from_lookup(lookup(&[(REGISTRY_VAR, "0xnope")])).unwrap_err();
        assert!(matches!(err, ConfigError::Address { name: REGISTRY_VAR, .. }));

        let err = Config::from_lookup(lookup(&[(RESOLVERS_VAR, "[1, 2]")])).unwrap_err();
        assert!(matches!(err, ConfigError::ResolverTable { .. }));

        let err = Config::from_lookup(lookup(&[(RPC_URL_VAR, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Url { .. }));
    }

    #[test]
    fn unknown_chain_has_no_resolver() {
        assert_eq!(NftResolverTable::empty().resolver_for(1), None);
        assert_eq!(NftResolverTable::default().resolver_for(424242), None);
    }
}
