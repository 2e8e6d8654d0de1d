//! # ens-nft
//!
//! Points [ENS](https://docs.ens.domains) names at NFTs and resolves them back,
//! using an [ERC-2381](https://eips.ethereum.org/EIPS/eip-2381) resolver that
//! stores a token id next to the name's address record.
//!
//! [`NameResolver`] turns a name into the NFT it designates and [`BindingPlanner`]
//! walks through the registry and resolver writes that bind a name to an NFT.
//! Both talk to the chain through a [`ChainQueryGateway`]; [`ProviderGateway`] is
//! the alloy implementation.

pub use config::{Config, NftResolverTable};
pub use domain_id::{namehash, reverse_name, DomainIdProvider, NamehashIdProvider};
pub use errors::*;
pub use gateway::ChainQueryGateway;
pub use planner::BindingPlanner;
pub use provider::{ProviderGateway, ProviderGatewayBuilder};
pub use resolver::NameResolver;
pub use types::*;
pub use validate::{validate_target, TargetIssue};

mod config;
pub mod consts;
mod contracts;
mod domain_id;
mod errors;
#[cfg(test)]
mod fake;
mod gateway;
pub mod name;
mod planner;
mod provider;
mod resolver;
mod types;
pub mod utils;
mod validate;
