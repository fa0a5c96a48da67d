//! Adaptador de preço em USD via Chainlink Feed Registry.

use async_trait::async_trait;
use ethereum_types::{Address, H160, U256};
use ethers::abi::{AbiParser, Function, Token};
use ethers::types::I256;
use ethernity_core::{
    error::{Error, Result},
    traits::ChainClient,
    utils::{token_amount_to_f64, u256_to_bigint},
};
use num_bigint::BigInt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Endereços de mainnet usados na conversão de preço
pub mod addresses {
    use super::H160;

    pub const FEED_REGISTRY: H160 = H160([
        0x47, 0xfb, 0x25, 0x85, 0xd2, 0xc5, 0x6f, 0xe1, 0x88, 0xd0, 0xe6, 0xec, 0x62, 0x8a, 0x38, 0xb7, 0x4d, 0xce,
        0xcf, 0x36,
    ]);
    pub const WBTC: H160 = H160([
        0x22, 0x60, 0xfa, 0xc5, 0xe5, 0x54, 0x2a, 0x77, 0x3a, 0xa4, 0x4f, 0xbc, 0xfe, 0xdf, 0x7c, 0x19, 0x3b, 0xc2,
        0xc5, 0x99,
    ]);
    pub const WETH: H160 = H160([
        0xc0, 0x2a, 0xaa, 0x39, 0xb2, 0x23, 0xfe, 0x8d, 0x0a, 0x0e, 0x5c, 0x4f, 0x27, 0xea, 0xd9, 0x08, 0x3c, 0x75,
        0x6c, 0xc2,
    ]);
    pub const STETH: H160 = H160([
        0xae, 0x7a, 0xb9, 0x65, 0x20, 0xde, 0x3a, 0x18, 0xe5, 0xe1, 0x11, 0xb5, 0xea, 0xab, 0x09, 0x53, 0x12, 0xd7,
        0xfe, 0x84,
    ]);
    /// Denominação Chainlink para ETH
    pub const ETH: H160 = H160([0xee; 20]);
    /// Denominação Chainlink para BTC
    pub const BTC: H160 = H160([0xbb; 20]);
    /// Denominação Chainlink para USD (ISO 4217: 840)
    pub const USD: H160 = H160([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x03, 0x48]);
}

/// Conversor de quantidades de token para USD.
///
/// `0.0` significa preço indisponível, nunca um preço válido.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Preço em USD por unidade do token na altura de bloco informada
    async fn get_price(&self, raw_amount: &BigInt, token: Address, block_number: u64) -> f64;
}

/// Substitui tokens embrulhados pela denominação do ativo base
pub fn canonical_asset(token: Address) -> Address {
    if token == addresses::WBTC {
        addresses::BTC
    } else if token == addresses::WETH || token == addresses::STETH {
        addresses::ETH
    } else {
        token
    }
}

/// Oráculo que consulta o Chainlink Feed Registry via `eth_call`
pub struct ChainlinkPriceOracle {
    client: Arc<dyn ChainClient>,
    registry: Address,
}

impl ChainlinkPriceOracle {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self::with_registry(client, addresses::FEED_REGISTRY)
    }

    pub fn with_registry(client: Arc<dyn ChainClient>, registry: Address) -> Self {
        Self { client, registry }
    }

    async fn query(&self, function: &Function, base: Address, block_number: u64) -> Result<Vec<Token>> {
        let data = function
            .encode_input(&[Token::Address(base), Token::Address(addresses::USD)])
            .map_err(|e| Error::DecodeError(format!("Falha ao codificar {}: {}", function.name, e)))?;
        let out = self.client.call(self.registry, data, Some(block_number)).await?;
        function
            .decode_output(&out)
            .map_err(|e| Error::DecodeError(format!("Resposta inválida de {}: {}", function.name, e)))
    }

    /// Consulta o preço, propagando qualquer falha
    pub async fn try_get_price(&self, token: Address, block_number: u64) -> Result<f64> {
        let base = canonical_asset(token);
        let round_data = parse_function("latestRoundData(address,address) view returns (uint80,int256,uint256,uint256,uint80)")?;
        let decimals_fn = parse_function("decimals(address,address) view returns (uint8)")?;

        let round = self.query(&round_data, base, block_number).await?;
        let answer = round
            .get(1)
            .cloned()
            .and_then(Token::into_int)
            .map(I256::from_raw)
            .ok_or_else(|| Error::DecodeError("answer ausente em latestRoundData".into()))?;
        if answer <= I256::zero() {
            return Err(Error::OracleUnavailable(format!("preço não positivo para {:?}", base)));
        }

        let decimals = self
            .query(&decimals_fn, base, block_number)
            .await?
            .first()
            .cloned()
            .and_then(Token::into_uint)
            .filter(|d| *d <= U256::from(255u64))
            .map(|d| d.as_u32() as u8)
            .ok_or_else(|| Error::DecodeError("decimals inválido no feed".into()))?;

        Ok(token_amount_to_f64(&u256_to_bigint(&answer.into_raw()), decimals))
    }
}

fn parse_function(signature: &str) -> Result<Function> {
    AbiParser::default()
        .parse_function(signature)
        .map_err(|e| Error::DecodeError(format!("ABI inválida '{}': {}", signature, e)))
}

#[async_trait]
impl PriceOracle for ChainlinkPriceOracle {
    async fn get_price(&self, raw_amount: &BigInt, token: Address, block_number: u64) -> f64 {
        match self.try_get_price(token, block_number).await {
            Ok(price) => {
                debug!(?token, block_number, price, %raw_amount, "preço obtido");
                price
            }
            Err(e) => {
                warn!(?token, block_number, error = %e, "preço indisponível");
                0.0
            }
        }
    }
}
