use async_trait::async_trait;
use ethereum_types::{Address, U256};
use ethers::abi::{AbiParser, Token};
use ethernity_core::{
    error::{Error, Result},
    traits::ChainClient,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Metadados de tokens ERC-20 consumidos pela detecção
#[async_trait]
pub trait TokenMetadata: Send + Sync {
    /// Casas decimais do token
    async fn decimals(&self, token: Address) -> Result<u8>;
}

/// Implementação via `decimals()` do ERC-20, com cache LRU por endereço
pub struct Erc20Metadata {
    client: Arc<dyn ChainClient>,
    cache: Mutex<LruCache<Address, u8>>,
}

impl Erc20Metadata {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self::with_capacity(client, 256)
    }

    pub fn with_capacity(client: Arc<dyn ChainClient>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl TokenMetadata for Erc20Metadata {
    async fn decimals(&self, token: Address) -> Result<u8> {
        let cached = self.cache.lock().get(&token).copied();
        if let Some(decimals) = cached {
            return Ok(decimals);
        }

        let function = AbiParser::default()
            .parse_function("decimals() view returns (uint8)")
            .map_err(|e| Error::DecodeError(e.to_string()))?;
        let data = function
            .encode_input(&[])
            .map_err(|e| Error::DecodeError(e.to_string()))?;
        let out = self.client.call(token, data, None).await?;
        let decimals = function
            .decode_output(&out)
            .map_err(|e| Error::DecodeError(format!("decimals() inválido: {}", e)))?
            .first()
            .cloned()
            .and_then(Token::into_uint)
            .filter(|d| *d <= U256::from(255u64))
            .map(|d| d.as_u32() as u8)
            .ok_or_else(|| Error::DecodeError("decimals() fora do intervalo".into()))?;

        self.cache.lock().put(token, decimals);
        Ok(decimals)
    }
}
