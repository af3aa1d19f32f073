use crate::error::ChainError;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use url::Url;

/// Builds providers for the configured RPC endpoint.
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// A read-only HTTP provider, enough for balance reads.
    pub fn http(rpc_url: &str) -> Result<DynProvider, ChainError> {
        let url = parse_url(rpc_url)?;
        Ok(ProviderBuilder::new().connect_http(url).erased())
    }

    /// An HTTP provider that signs and fills transactions with the given key.
    ///
    /// Returns the provider together with the signer's address, which is the
    /// account whose balances are read and whose tokens are approved.
    pub fn http_with_signer(
        rpc_url: &str,
        private_key: &str,
    ) -> Result<(DynProvider, Address), ChainError> {
        let url = parse_url(rpc_url)?;
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| ChainError::Signer(format!("Invalid private key: {}", e)))?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect_http(url)
            .erased();
        Ok((provider, address))
    }
}

fn parse_url(rpc_url: &str) -> Result<Url, ChainError> {
    Url::parse(rpc_url).map_err(|e| ChainError::Config(format!("Invalid RPC URL: {}", e)))
}

/// Parses a user-supplied account address.
pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChainError::InvalidAddress(raw.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| ChainError::InvalidAddress(raw.to_string()))
}
