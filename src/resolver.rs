use crate::{
    consts,
    errors::NameError,
    gateway::ChainQueryGateway,
    name::check_search_input,
    types::{NftKind, Resolution, ResolutionOutcome, SearchStatus},
    utils::{display_address, is_unset_token_id},
};
use alloy::primitives::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Resolves ENS names to the NFT they point at.
///
/// Each [`submit`](Self::submit) or [`check_input`](Self::check_input) starts a
/// new attempt. Results that arrive for an older attempt are dropped, so the
/// state returned by [`snapshot`](Self::snapshot) only ever describes the
/// latest one.
pub struct NameResolver<G> {
    gateway: G,
    attempts: AtomicU64,
    state: Mutex<Resolution>,
}

/// How far the token id side of a lookup got.
#[derive(Debug)]
enum TokenBranch {
    ResolverReadFailed,
    NoResolver,
    Failed(ResolutionOutcome),
    TokenId(String),
}

/// How far the contract address side of a lookup got.
#[derive(Debug)]
enum ContractBranch {
    ReadFailed,
    NoAddress,
    Classified(Address, NftKind),
}

impl<G> NameResolver<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            attempts: AtomicU64::new(0),
            state: Mutex::new(Resolution::new(0, "", SearchStatus::Idle)),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn snapshot(&self) -> Resolution {
        self.state.lock().await.clone()
    }

    async fn begin(&self, name: &str, status: SearchStatus) -> u64 {
        let mut state = self.state.lock().await;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        *state = Resolution::new(attempt, name, status);
        attempt
    }

    /// Applies `update` unless a newer attempt has started. Returns whether it was applied.
    async fn apply(&self, attempt: u64, update: impl FnOnce(&mut Resolution)) -> bool {
        let mut state = self.state.lock().await;
        if state.attempt != attempt {
            tracing::debug!(attempt, current = state.attempt, "discarding stale result");
            return false;
        }
        update(&mut *state);
        true
    }

    async fn finish(&self, attempt: u64) -> Option<Resolution> {
        let mut state = self.state.lock().await;
        if state.attempt != attempt {
            return None;
        }
        let descriptor = state.descriptor.clone();
        if let SearchStatus::Resolved(ResolutionOutcome::Found(found)) = &mut state.status {
            *found = descriptor;
        }
        Some(state.clone())
    }
}

impl<G: ChainQueryGateway> NameResolver<G> {
    /// Validates the search box on every keystroke. Editing discards the previous result.
    pub async fn check_input(&self, input: &str) -> Result<String, NameError> {
        let checked = check_search_input(input);
        let status = match checked {
            Ok(_) => SearchStatus::Idle,
            Err(_) => SearchStatus::Resolved(ResolutionOutcome::NotAnEnsName),
        };
        self.begin(input, status).await;
        checked
    }

    /// Looks `input` up. Returns `None` if a newer attempt superseded this one.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn submit(&self, input: &str) -> Option<Resolution> {
        let name = match check_search_input(input) {
            Ok(name) => name,
            Err(err) => {
                tracing::debug!("not an ens name: {err}");
                let status = SearchStatus::Resolved(ResolutionOutcome::NotAnEnsName);
                let attempt = self.begin(input, status).await;
                return self.finish(attempt).await;
            }
        };

        let attempt = self.begin(&name, SearchStatus::Resolving).await;
        tokio::join!(
            self.lookup_name_owner(attempt, &name),
            self.lookup_nft(attempt, &name)
        );
        let resolution = self.finish(attempt).await;
        if let Some(resolution) = &resolution {
            tracing::debug!(outcome = ?resolution.status, "resolution finished");
        }
        resolution
    }

    async fn lookup_name_owner(&self, attempt: u64, name: &str) {
        let owner = match self.gateway.registry_owner(name).await {
            Ok(owner) => owner,
            Err(err) => {
                tracing::warn!("registry owner lookup failed: {err}");
                None
            }
        };
        let Some(owner) = owner else {
            return;
        };

        let applied = self
            .apply(attempt, |state| {
                state.descriptor.name_owner = Some(owner);
                state.name_owner_display = Some(display_address(owner, None));
            })
            .await;
        if applied {
            let display = display_address(owner, self.reverse_name(owner).await);
            self.apply(attempt, |state| state.name_owner_display = Some(display))
                .await;
        }
    }

    async fn lookup_nft(&self, attempt: u64, name: &str) {
        let (token, contract) = tokio::join!(
            self.lookup_token_id(attempt, name),
            self.lookup_contract(attempt, name)
        );

        let outcome = settle(&token, &contract);
        let published = self
            .apply(attempt, |state| {
                state.status = SearchStatus::Resolved(
                    outcome.unwrap_or_else(|| ResolutionOutcome::Found(state.descriptor.clone())),
                )
            })
            .await;

        if let (
            true,
            TokenBranch::TokenId(token_id),
            ContractBranch::Classified(contract, NftKind::Erc721),
        ) = (published, token, contract)
        {
            self.lookup_nft_owner(attempt, contract, &token_id).await;
        }
    }

    async fn lookup_token_id(&self, attempt: u64, name: &str) -> TokenBranch {
        let resolver = match self.gateway.registry_resolver(name).await {
            Ok(Some(resolver)) => resolver,
            Ok(None) => return TokenBranch::NoResolver,
            Err(err) => {
                tracing::warn!("resolver lookup failed: {err}");
                return TokenBranch::ResolverReadFailed;
            }
        };

        if !self
            .probe(resolver, consts::ERC2381_RESOLVER_INTERFACE)
            .await
        {
            return TokenBranch::Failed(ResolutionOutcome::ResolverDoesNotSupportBinding);
        }

        let token_id = match self.gateway.token_id(resolver, name).await {
            Ok(Some(token_id)) if !is_unset_token_id(&token_id) => token_id,
            Ok(_) => return TokenBranch::Failed(ResolutionOutcome::TokenIdNotSet),
            Err(err) => {
                tracing::warn!(%resolver, "token id lookup failed: {err}");
                return TokenBranch::Failed(ResolutionOutcome::QueryError);
            }
        };

        self.apply(attempt, |state| {
            state.descriptor.token_id = Some(token_id.clone())
        })
        .await;
        TokenBranch::TokenId(token_id)
    }

    async fn lookup_contract(&self, attempt: u64, name: &str) -> ContractBranch {
        let contract = match self.gateway.address_record(name).await {
            Ok(Some(contract)) => contract,
            Ok(None) => return ContractBranch::NoAddress,
            Err(err) => {
                tracing::warn!("address record lookup failed: {err}");
                return ContractBranch::ReadFailed;
            }
        };

        self.apply(attempt, |state| {
            state.descriptor.contract_address = Some(contract)
        })
        .await;

        let (erc721, erc1155) = tokio::join!(
            self.probe(contract, consts::ERC721_INTERFACE),
            self.probe(contract, consts::ERC1155_INTERFACE)
        );
        let kind = match (erc721, erc1155) {
            (true, _) => NftKind::Erc721,
            (false, true) => NftKind::Erc1155,
            (false, false) => NftKind::Unknown,
        };
        tracing::debug!(%contract, ?kind, "classified contract");
        ContractBranch::Classified(contract, kind)
    }

    async fn lookup_nft_owner(&self, attempt: u64, contract: Address, token_id: &str) {
        let owner = match self.gateway.owner_of(contract, token_id).await {
            Ok(owner) if !owner.is_zero() => owner,
            Ok(_) => return,
            Err(err) => {
                tracing::debug!(%contract, token_id, "ownerOf failed: {err}");
                return;
            }
        };

        let applied = self
            .apply(attempt, |state| {
                state.descriptor.nft_owner = Some(owner);
                state.nft_owner_display = Some(display_address(owner, None));
            })
            .await;
        if applied {
            let display = display_address(owner, self.reverse_name(owner).await);
            self.apply(attempt, |state| state.nft_owner_display = Some(display))
                .await;
        }
    }

    /// A failing probe counts as "not supported".
    async fn probe(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        self.gateway
            .supports_interface(contract, interface_id)
            .await
            .unwrap_or_else(|err| {
                tracing::debug!(%contract, "supportsInterface failed: {err}");
                false
            })
    }

    async fn reverse_name(&self, address: Address) -> Option<String> {
        self.gateway
            .reverse_resolve(address)
            .await
            .unwrap_or_else(|err| {
                tracing::debug!(%address, "reverse resolution failed: {err}");
                None
            })
    }
}

/// Picks the outcome of a finished lookup, `None` meaning found.
///
/// Failures are ranked so that the same chain state always yields the same
/// outcome, whichever branch finished first.
fn settle(token: &TokenBranch, contract: &ContractBranch) -> Option<ResolutionOutcome> {
    match (token, contract) {
        (TokenBranch::ResolverReadFailed, _) | (_, ContractBranch::ReadFailed) => {
            Some(ResolutionOutcome::NameNotFound)
        }
        (_, ContractBranch::NoAddress) => Some(ResolutionOutcome::NoAddressSet),
        (_, ContractBranch::Classified(_, NftKind::Unknown)) => {
            Some(ResolutionOutcome::NotAnNftContract(NftKind::Unknown))
        }
        (TokenBranch::NoResolver, _) => Some(ResolutionOutcome::NameNotFound),
        (TokenBranch::Failed(outcome), _) => Some(outcome.clone()),
        (TokenBranch::TokenId(_), ContractBranch::Classified(_, NftKind::Erc1155)) => {
            Some(ResolutionOutcome::NotAnNftContract(NftKind::Erc1155))
        }
        (TokenBranch::TokenId(_), ContractBranch::Classified(_, NftKind::Erc721)) => None,
    }
}
