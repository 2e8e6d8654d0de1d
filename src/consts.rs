use crate::contracts;
use alloy::{
    primitives::{address, Address},
    sol_types::SolCall,
};

pub const DEFAULT_ETHEREUM_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";
pub const MAINNET_ENS_ADDRESS: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// ERC-2381 capability: the resolver stores a token id per name.
pub const ERC2381_RESOLVER_INTERFACE: [u8; 4] =
    <contracts::INftResolver::tokenIdCall as SolCall>::SELECTOR;
// https://eips.ethereum.org/EIPS/eip-721
pub const ERC721_INTERFACE: [u8; 4] = [0x80, 0xac, 0x58, 0xcd];
// https://eips.ethereum.org/EIPS/eip-1155
pub const ERC1155_INTERFACE: [u8; 4] = [0xd9, 0xb6, 0x7a, 0x26];

/// Only names under these top level labels can be searched.
pub const SUPPORTED_TLDS: &[&str] = &["eth"];

pub const REVERSE_REGISTRAR_SUFFIX: &str = "addr.reverse";

/// ERC-2381 resolver deployments, keyed by chain id.
/// Placeholders, not verified deployments: set `ENS_NFT_RESOLVERS` before sending writes.
pub const NFT_RESOLVERS: &[(u64, Address)] = &[
    (1, address!("4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41")),
    (5, address!("d7a4F6473f32aC2Af804B3686AE8F1932bC35750")),
    (11155111, address!("8FADE66B79cC9f707aB26799354482EB93a5B7dD")),
];
