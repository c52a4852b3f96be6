use crate::models::Chain;
use bs58;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid EVM address format: {0}")]
    InvalidEvmAddress(String),

    #[error("Invalid Solana address format: {0}")]
    InvalidSolanaAddress(String),

    #[error("Invalid network name: {0}")]
    InvalidNetwork(String),
}

pub fn validate_evm_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidEvmAddress(address.to_string()))?;

    // 20 bytes, hex encoded
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidEvmAddress(address.to_string()));
    }

    Ok(())
}

pub fn validate_solana_address(address: &str) -> Result<(), ValidationError> {
    // Check if address is empty
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    // Decode base58 string
    let decoded = match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return Err(ValidationError::InvalidSolanaAddress(address.to_string())),
    };

    // Validate length (Solana addresses are 32 bytes)
    if decoded.len() != 32 {
        return Err(ValidationError::InvalidSolanaAddress(address.to_string()));
    }

    Ok(())
}

pub fn validate_address(address: &str, chain: Chain) -> Result<(), ValidationError> {
    match chain {
        Chain::Evm => validate_evm_address(address),
        Chain::Solana => validate_solana_address(address),
    }
}

/// Network identifiers such as `base` or `base-sepolia`: lowercase
/// alphanumerics and dashes only.
pub fn validate_network(network: &str) -> Result<(), ValidationError> {
    let valid = !network.is_empty()
        && network
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidNetwork(network.to_string()))
    }
}

/// Canonical form used for storage and lookup. Hex addresses are compared
/// case-insensitively (checksum casing varies between producers); base58 is
/// case-sensitive and left alone.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        trimmed.to_ascii_lowercase()
    } else {
        trimmed.to_string()
    }
}
