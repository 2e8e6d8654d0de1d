use crate::errors::GatewayError;
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::sync::Arc;

/// Every chain read and write the resolver and the planner depend on.
///
/// Reads return `None` when a record is absent (zero address, empty name).
/// Writes resolve once the transaction is mined and return its hash.
/// Token ids are decimal strings at this boundary.
#[async_trait]
pub trait ChainQueryGateway: Send + Sync {
    /// Owner of `name` in the ENS registry.
    async fn registry_owner(&self, name: &str) -> Result<Option<Address>, GatewayError>;

    /// Resolver contract registered for `name`.
    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>, GatewayError>;

    /// The standard `addr` record of `name`, looked up through its resolver.
    async fn address_record(&self, name: &str) -> Result<Option<Address>, GatewayError>;

    async fn set_registry_resolver(
        &self,
        name: &str,
        resolver: Address,
    ) -> Result<TxHash, GatewayError>;

    /// ERC-165 `supportsInterface`.
    async fn supports_interface(
        &self,
        contract: Address,
        interface_id: [u8; 4],
    ) -> Result<bool, GatewayError>;

    async fn token_id(&self, resolver: Address, name: &str)
        -> Result<Option<String>, GatewayError>;

    async fn set_token_id(
        &self,
        resolver: Address,
        name: &str,
        token_id: &str,
    ) -> Result<TxHash, GatewayError>;

    async fn set_address_record(
        &self,
        resolver: Address,
        name: &str,
        address: Address,
    ) -> Result<TxHash, GatewayError>;

    /// ERC-721 `ownerOf`.
    async fn owner_of(&self, contract: Address, token_id: &str) -> Result<Address, GatewayError>;

    /// Primary name of `address`, if one is set.
    async fn reverse_resolve(&self, address: Address) -> Result<Option<String>, GatewayError>;

    async fn record_exists(&self, name: &str) -> Result<bool, GatewayError>;

    /// Whether there is code deployed at `address`.
    async fn contract_exists(&self, address: Address) -> Result<bool, GatewayError>;

    async fn token_exists(&self, contract: Address, token_id: &str) -> Result<bool, GatewayError>;

    async fn chain_id(&self) -> Result<u64, GatewayError>;
}

#[async_trait]
impl<G: ChainQueryGateway + ?Sized> ChainQueryGateway for Arc<G> {
    async fn registry_owner(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        (**self).registry_owner(name).await
    }

    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        (**self).registry_resolver(name).await
    }

    async fn address_record(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        (**self).address_record(name).await
    }

    async fn set_registry_resolver(
        &self,
        name: &str,
        resolver: Address,
    ) -> Result<TxHash, GatewayError> {
        (**self).set_registry_resolver(name, resolver).await
    }

    async fn supports_interface(
        &self,
        contract: Address,
        interface_id: [u8; 4],
    ) -> Result<bool, GatewayError> {
        (**self).supports_interface(contract, interface_id).await
    }

    async fn token_id(
        &self,
        resolver: Address,
        name: &str,
    ) -> Result<Option<String>, GatewayError> {
        (**self).token_id(resolver, name).await
    }

    async fn set_token_id(
        &self,
        resolver: Address,
        name: &str,
        token_id: &str,
    ) -> Result<TxHash, GatewayError> {
        (**self).set_token_id(resolver, name, token_id).await
    }

    async fn set_address_record(
        &self,
        resolver: Address,
        name: &str,
        address: Address,
    ) -> Result<TxHash, GatewayError> {
        (**self).set_address_record(resolver, name, address).await
    }

    async fn owner_of(&self, contract: Address, token_id: &str) -> Result<Address, GatewayError> {
        (**self).owner_of(contract, token_id).await
    }

    async fn reverse_resolve(&self, address: Address) -> Result<Option<String>, GatewayError> {
        (**self).reverse_resolve(address).await
    }

    async fn record_exists(&self, name: &str) -> Result<bool, GatewayError> {
        (**self).record_exists(name).await
    }

    async fn contract_exists(&self, address: Address) -> Result<bool, GatewayError> {
        (**self).contract_exists(address).await
    }

    async fn token_exists(&self, contract: Address, token_id: &str) -> Result<bool, GatewayError> {
        (**self).token_exists(contract, token_id).await
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        (**self).chain_id().await
    }
}
