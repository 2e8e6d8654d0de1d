//! Checks run on a binding target before a planning session is opened.

use crate::{
    errors::NameError,
    gateway::ChainQueryGateway,
    name::check_search_input,
    types::NameBindingTarget,
    utils::parse_token_id,
};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something wrong with one field of a [`NameBindingTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetIssue {
    InvalidName(String),
    NameNotOwnedOrMissing,
    NotAContract(Address),
    InvalidTokenId(String),
    TokenNotFound,
}

impl From<NameError> for TargetIssue {
    fn from(err: NameError) -> Self {
        TargetIssue::InvalidName(err.to_string())
    }
}

impl fmt::Display for TargetIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetIssue::InvalidName(reason) => write!(f, "Not a valid ENS name: {reason}"),
            TargetIssue::NameNotOwnedOrMissing => f.write_str("This name does not exist yet"),
            TargetIssue::NotAContract(address) => {
                write!(f, "{address} is not a contract")
            }
            TargetIssue::InvalidTokenId(token_id) => {
                write!(f, "{token_id:?} is not a valid token ID")
            }
            TargetIssue::TokenNotFound => f.write_str("No token with this ID exists in the contract"),
        }
    }
}

/// Returns every problem found with `target`; empty means it can be planned.
///
/// Chain reads that fail are logged and skipped, so a flaky RPC never blocks
/// a target on its own.
#[tracing::instrument(skip_all, fields(name = %target.name))]
pub async fn validate_target<G: ChainQueryGateway>(
    gateway: &G,
    target: &NameBindingTarget,
) -> Vec<TargetIssue> {
    let mut issues = Vec::new();

    let name = match check_search_input(&target.name) {
        Ok(name) => Some(name),
        Err(err) => {
            issues.push(err.into());
            None
        }
    };
    let token_valid = match parse_token_id(&target.token_id) {
        Ok(_) => true,
        Err(_) => {
            issues.push(TargetIssue::InvalidTokenId(target.token_id.clone()));
            false
        }
    };

    let record = async {
        match &name {
            Some(name) => Some(gateway.record_exists(name).await),
            None => None,
        }
    };
    let contract = gateway.contract_exists(target.nft_contract_address);
    let (record, contract) = tokio::join!(record, contract);

    match record {
        Some(Ok(false)) => issues.push(TargetIssue::NameNotOwnedOrMissing),
        Some(Err(err)) => tracing::warn!("recordExists failed: {err}"),
        _ => {}
    }

    let is_contract = match contract {
        Ok(exists) => exists,
        Err(err) => {
            tracing::warn!("code lookup failed: {err}");
            return issues;
        }
    };
    if !is_contract {
        issues.push(TargetIssue::NotAContract(target.nft_contract_address));
        return issues;
    }

    if token_valid {
        match gateway
            .token_exists(target.nft_contract_address, &target.token_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => issues.push(TargetIssue::TokenNotFound),
            Err(err) => tracing::warn!("ownerOf failed: {err}"),
        }
    }
    issues
}
