use crate::types::BindingStep;
use alloy::{providers::PendingTransactionError, transports::TransportError};
use thiserror::Error;

/// Errors surfaced by a [`ChainQueryGateway`](crate::ChainQueryGateway).
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Thrown when the gateway itself errors (fake gateways, custom backends)
    #[error("{0}")]
    Internal(anyhow::Error),

    #[error("contract call error: {0}")]
    ContractCall(#[from] alloy::contract::Error),

    #[error("rpc error: {0}")]
    Rpc(#[from] TransportError),

    #[error("transaction was not confirmed: {0}")]
    PendingTransaction(#[from] PendingTransactionError),

    #[error("invalid token id: {0}")]
    InvalidTokenId(String),

    /// Reverse record exists but the name does not resolve back to the address
    #[error("Reversed ens name not pointing to itself: {0}")]
    EnsNotOwned(String),
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::Internal(err)
    }
}

/// Why a candidate string is not a searchable ENS name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    /// Rejected by ENSIP-15 normalization
    #[error("invalid name: {0}")]
    Invalid(String),

    #[error("name does not normalize to itself, expected {0:?}")]
    NotNormalized(String),

    #[error("unsupported top level label {0:?}")]
    UnsupportedTld(String),
}

/// Handle binding planner specific errors.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("no planning session is open")]
    NoSession,

    /// The session was closed or replaced while the call was in flight
    #[error("planning session was closed")]
    SessionClosed,

    #[error("{0} is already satisfied or in progress")]
    StepNotEnabled(BindingStep),

    #[error("cannot bind this name: {0}")]
    InvalidName(#[from] NameError),

    #[error("no ERC-2381 resolver is known for this name")]
    NoConformantResolver,

    #[error("no NFT resolver is deployed on chain {0}")]
    UnsupportedChain(u64),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not a valid url: {reason}")]
    Url { name: &'static str, reason: String },

    #[error("{name} is not a valid address: {reason}")]
    Address { name: &'static str, reason: String },

    #[error("{name} is not a valid resolver table: {source}")]
    ResolverTable {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
