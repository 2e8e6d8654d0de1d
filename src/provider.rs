use crate::{
    consts, contracts,
    domain_id::{reverse_name, DomainIdProvider},
    errors::GatewayError,
    gateway::ChainQueryGateway,
    utils::{non_zero, parse_token_id},
    Config, NamehashIdProvider,
};
use alloy::{
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::http::reqwest::Url,
};
use async_trait::async_trait;

/// [`ChainQueryGateway`] backed by an alloy provider.
///
/// Writes are signed by whatever wallet the provider was built with.
pub struct ProviderGateway<P, D> {
    provider: P,
    registry_address: Address,
    domain_id_provider: D,
}

pub struct ProviderGatewayBuilder<P, D> {
    provider: Option<P>,
    registry_address: Option<Address>,
    domain_id_provider: D,
}

impl<P> Default for ProviderGatewayBuilder<P, NamehashIdProvider> {
    fn default() -> Self {
        ProviderGatewayBuilder {
            provider: None,
            registry_address: None,
            domain_id_provider: NamehashIdProvider,
        }
    }
}

impl<P, D> ProviderGatewayBuilder<P, D>
where
    P: Provider,
    D: DomainIdProvider,
{
    pub fn with_provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_registry_address(mut self, registry_address: Address) -> Self {
        self.registry_address = Some(registry_address);
        self
    }

    pub fn with_domain_id_provider<D2>(
        self,
        domain_id_provider: D2,
    ) -> ProviderGatewayBuilder<P, D2> {
        ProviderGatewayBuilder {
            provider: self.provider,
            registry_address: self.registry_address,
            domain_id_provider,
        }
    }

    pub fn build(self) -> Result<ProviderGateway<P, D>, String> {
        let provider = self.provider.ok_or("provider is required".to_string())?;
        Ok(ProviderGateway {
            provider,
            registry_address: self
                .registry_address
                .unwrap_or(consts::MAINNET_ENS_ADDRESS),
            domain_id_provider: self.domain_id_provider,
        })
    }
}

impl<P, D> ProviderGateway<P, D> {
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn registry_address(&self) -> Address {
        self.registry_address
    }

    pub fn domain_id_provider(&self) -> &D {
        &self.domain_id_provider
    }
}

impl<P: Provider> ProviderGateway<P, NamehashIdProvider> {
    pub fn builder() -> ProviderGatewayBuilder<P, NamehashIdProvider> {
        ProviderGatewayBuilder::default()
    }

    /// Creates a gateway against the mainnet registry
    /// `inner` the provider used for reads and writes
    pub fn new(inner: P) -> Self {
        ProviderGateway {
            provider: inner,
            registry_address: consts::MAINNET_ENS_ADDRESS,
            domain_id_provider: NamehashIdProvider,
        }
    }
}

impl ProviderGateway<DynProvider, NamehashIdProvider> {
    /// Read-only gateway over HTTP.
    pub fn on_http(url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Self::new(provider)
    }

    pub fn from_config(config: &Config) -> Self {
        let mut gateway = Self::on_http(config.rpc_url.clone());
        gateway.registry_address = config.registry_address;
        gateway
    }
}

#[async_trait]
impl<P, D> ChainQueryGateway for ProviderGateway<P, D>
where
    P: Provider,
    D: DomainIdProvider,
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn registry_owner(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let registry = contracts::ENS::new(self.registry_address, &self.provider);
        let owner = registry.owner(node).call().await?;
        Ok(non_zero(owner))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn registry_resolver(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let registry = contracts::ENS::new(self.registry_address, &self.provider);
        let resolver = registry.resolver(node).call().await?;
        Ok(non_zero(resolver))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn address_record(&self, name: &str) -> Result<Option<Address>, GatewayError> {
        let Some(resolver) = self.registry_resolver(name).await? else {
            return Ok(None);
        };
        let node = self.domain_id_provider.generate(name);
        let resolver = contracts::INftResolver::new(resolver, &self.provider);
        let addr = resolver.addr(node).call().await?;
        Ok(non_zero(addr))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn set_registry_resolver(
        &self,
        name: &str,
        resolver: Address,
    ) -> Result<TxHash, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let registry = contracts::ENS::new(self.registry_address, &self.provider);
        let tx_hash = registry
            .setResolver(node, resolver)
            .send()
            .await?
            .watch()
            .await?;
        tracing::debug!(%tx_hash, "resolver set");
        Ok(tx_hash)
    }

    #[tracing::instrument(
        skip(self, interface_id),
        fields(interface_id = %alloy::hex::encode_prefixed(interface_id)),
        level = "debug"
    )]
    async fn supports_interface(
        &self,
        contract: Address,
        interface_id: [u8; 4],
    ) -> Result<bool, GatewayError> {
        let contract = contracts::IERC165::new(contract, &self.provider);
        let supported = contract
            .supportsInterface(interface_id.into())
            .call()
            .await?;
        Ok(supported)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn token_id(
        &self,
        resolver: Address,
        name: &str,
    ) -> Result<Option<String>, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let resolver = contracts::INftResolver::new(resolver, &self.provider);
        let token_id = resolver.tokenId(node).call().await?;
        Ok(Some(token_id.to_string()))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn set_token_id(
        &self,
        resolver: Address,
        name: &str,
        token_id: &str,
    ) -> Result<TxHash, GatewayError> {
        let token_id = parse_token_id(token_id)?;
        let node = self.domain_id_provider.generate(name);
        let resolver = contracts::INftResolver::new(resolver, &self.provider);
        let tx_hash = resolver
            .setTokenId(node, token_id)
            .send()
            .await?
            .watch()
            .await?;
        tracing::debug!(%tx_hash, "token id set");
        Ok(tx_hash)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn set_address_record(
        &self,
        resolver: Address,
        name: &str,
        address: Address,
    ) -> Result<TxHash, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let resolver = contracts::INftResolver::new(resolver, &self.provider);
        let tx_hash = resolver
            .setAddr(node, address)
            .send()
            .await?
            .watch()
            .await?;
        tracing::debug!(%tx_hash, "address record set");
        Ok(tx_hash)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn owner_of(&self, contract: Address, token_id: &str) -> Result<Address, GatewayError> {
        let token_id = parse_token_id(token_id)?;
        let owner = contracts::IERC721::new(contract, &self.provider)
            .ownerOf(token_id)
            .call()
            .await?;
        Ok(owner)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn reverse_resolve(&self, address: Address) -> Result<Option<String>, GatewayError> {
        let reverse = reverse_name(&address);
        let Some(resolver) = self.registry_resolver(&reverse).await? else {
            return Ok(None);
        };
        let node = self.domain_id_provider.generate(&reverse);
        let name = contracts::INameResolver::new(resolver, &self.provider)
            .name(node)
            .call()
            .await?;
        if name.is_empty() {
            return Ok(None);
        }

        // a reverse record is only trusted when the name points back at the address
        if self.address_record(&name).await? != Some(address) {
            return Err(GatewayError::EnsNotOwned(name));
        }
        Ok(Some(name))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn record_exists(&self, name: &str) -> Result<bool, GatewayError> {
        let node = self.domain_id_provider.generate(name);
        let registry = contracts::ENS::new(self.registry_address, &self.provider);
        Ok(registry.recordExists(node).call().await?)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn contract_exists(&self, address: Address) -> Result<bool, GatewayError> {
        let code = self.provider.get_code_at(address).await?;
        Ok(!code.is_empty())
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn token_exists(&self, contract: Address, token_id: &str) -> Result<bool, GatewayError> {
        match self.owner_of(contract, token_id).await {
            Ok(owner) => Ok(!owner.is_zero()),
            // ownerOf reverts for tokens that were never minted
            Err(GatewayError::ContractCall(err)) => {
                tracing::debug!("ownerOf reverted: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        Ok(self.provider.get_chain_id().await?)
    }
}
