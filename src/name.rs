//! ENS name normalization and search-input checks.
//!
//! Normalization is [ENSIP-15](https://docs.ens.domains/ensip/15): UTS-46 style
//! mapping, emoji handling, and the script and confusable rules that reject
//! lookalike names.

use crate::{consts::SUPPORTED_TLDS, errors::NameError};
use ens_normalize_rs::EnsNameNormalizer;
use std::sync::LazyLock;

static NORMALIZER: LazyLock<EnsNameNormalizer> = LazyLock::new(EnsNameNormalizer::default);

/// Normalizes `name`, or explains why ENSIP-15 rejects it.
pub fn normalize(name: &str) -> Result<String, NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    NORMALIZER
        .normalize(name)
        .map_err(|err| NameError::Invalid(err.to_string()))
}

/// Checks what the user typed into the search box.
///
/// Mismatched case is accepted, anything that normalization would rewrite in
/// some other way is not.
pub fn check_search_input(input: &str) -> Result<String, NameError> {
    let normalized = normalize(input)?;
    if normalized != input.to_lowercase() {
        return Err(NameError::NotNormalized(normalized));
    }

    match normalized.rsplit_once('.') {
        Some((_, tld)) if SUPPORTED_TLDS.contains(&tld) => Ok(normalized),
        Some((_, tld)) => Err(NameError::UnsupportedTld(tld.to_string())),
        None => Err(NameError::UnsupportedTld(normalized)),
    }
}
