use crate::errors::GatewayError;
use alloy::primitives::{Address, U256};

/// Parses a decimal (or `0x` prefixed hex) token id.
pub fn parse_token_id(token_id: &str) -> Result<U256, GatewayError> {
    let token_id = token_id.trim();
    if token_id.is_empty() {
        return Err(GatewayError::InvalidTokenId(token_id.to_string()));
    }
    token_id
        .parse::<U256>()
        .map_err(|e| GatewayError::InvalidTokenId(format!("{token_id}: {e}")))
}

/// A resolver answers zero for names it has no token id for.
pub fn is_unset_token_id(token_id: &str) -> bool {
    let token_id = token_id.trim();
    token_id.is_empty() || parse_token_id(token_id).is_ok_and(|id| id.is_zero())
}

pub(crate) fn non_zero(address: Address) -> Option<Address> {
    (!address.is_zero()).then_some(address)
}

/// What the UI shows for an owner: its primary name when there is one.
pub fn display_address(address: Address, reverse_name: Option<String>) -> String {
    reverse_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| address.to_checksum(None))
}
