/// This module provides a way to generate a domain id from a domain name.
/// The domain id is the `node` every registry and resolver call is keyed by.
/// Most commonly the domain id is generated using the namehash algorithm,
/// however callers can plug in other algorithms (e.g. for test registries).
use crate::consts::REVERSE_REGISTRAR_SUFFIX;
use alloy::{
    hex,
    primitives::{keccak256, Address, B256},
};

pub trait DomainIdProvider: Clone + Send + Sync {
    fn generate(&self, name: &str) -> B256;
}

#[derive(Default, Debug, Clone)]
pub struct NamehashIdProvider;

impl DomainIdProvider for NamehashIdProvider {
    fn generate(&self, name: &str) -> B256 {
        namehash(name)
    }
}

/// Returns the ENS namehash as specified in [EIP-137](https://eips.ethereum.org/EIPS/eip-137)
///
/// `name` is hashed as given, so it must already be normalized with
/// [`crate::name::normalize`]. Unnormalized input hashes to a different node.
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }

    // Remove the variation selector U+FE0F
    let name = name.replace('\u{fe0f}', "");

    // Generate the node starting from the right
    name.rsplit('.')
        .fold([0u8; 32], |node, label| {
            keccak256([node, keccak256(label.as_bytes()).into()].concat()).into()
        })
        .into()
}

/// Name under which the reverse record of `address` lives,
/// e.g. `d8da6bf26964af9d7eed9e03e53415d37aa96045.addr.reverse`.
pub fn reverse_name(address: &Address) -> String {
    format!("{}.{REVERSE_REGISTRAR_SUFFIX}", hex::encode(address))
}
