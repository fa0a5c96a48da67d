//! Tabela de assinaturas de eventos reconhecidas pelo classificador.
//!
//! Cada assinatura (topic[0]) é mapeada para uma variante de
//! [`EventSignature`], que sabe decodificar o payload do log em um
//! [`LogEvent`]. Adicionar um evento é adicionar uma entrada na tabela.

use ethereum_types::{Address, H256};
use ethers::abi::{decode, ParamType, Token};
use ethernity_core::{
    error::{Error, Result},
    types::LogEntry,
    utils::{bytes_to_bigint, hex_to_h256, u256_to_bigint},
};
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Eventos conhecidos do padrão flash loan + doação + liquidação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSignature {
    /// FlashLoan do Aave: `(amount, premium, referralCode)`
    AaveFlashLoan,
    /// FlashLoan do Balancer: `(amount, feeAmount)`
    BalancerFlashLoan,
    Donate,
    Borrow,
    Repay,
    /// Liquidação: `(collateral, repay, yield)`
    Liquidation,
    /// Saque: `(amount)`
    Withdraw,
    /// Transfer ERC-20
    Transfer,
}

const SIGNATURE_TABLE: [(EventSignature, &str); 8] = [
    (EventSignature::AaveFlashLoan, "0x631042c832b07452973831137f2d73e395028b44b250dedc5abb0ee766e168ac"),
    (EventSignature::BalancerFlashLoan, "0x0d7d75e01ab95780d3cd1c8ec0dd6c2ce19e3a20427eec8bf53283b6fb8e95f0"),
    (EventSignature::Donate, "0x1e090bfa40abafd9102cc09ab955b704519a275c8e78b2549f66c1b4439ce9d7"),
    (EventSignature::Borrow, "0x312a5e5e1079f5dda4e95dbbd0b908b291fd5b992ef22073643ab691572c5b52"),
    (EventSignature::Repay, "0x05f2eeda0e08e4b437f487c8d7d29b14537d15e3488170dc3de5dbdf8dac4684"),
    (EventSignature::Liquidation, "0x258be119f0bb402a931bfc28de6236747c14f2a56e87e9e7fe5151976b65e5a0"),
    (EventSignature::Withdraw, "0x0afd74a2a0a78f6c15e41029f44995ee023fe49276f44a4b2b2cf674829362e6"),
    (EventSignature::Transfer, "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
];

static TOPIC_MAP: Lazy<HashMap<H256, EventSignature>> = Lazy::new(|| {
    SIGNATURE_TABLE
        .iter()
        .filter_map(|(sig, hex)| hex_to_h256(hex).map(|topic| (topic, *sig)))
        .collect()
});

/// Conteúdo decodificado de um log reconhecido
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    FlashLoan { amount: BigInt, fee: BigInt },
    Donate,
    /// Borrow/Repay: a transferência seguinte é efeito colateral
    SkipNextTransfer,
    Liquidation { collateral: Address, repay: BigInt, yield_amount: BigInt },
    Withdraw { amount: BigInt },
    Transfer {
        from: Option<H256>,
        to: Option<H256>,
        /// `None` quando o payload está vazio
        amount: Option<BigInt>,
    },
}

impl EventSignature {
    /// Identifica a assinatura a partir do topic[0]
    pub fn from_topic(topic: &H256) -> Option<Self> {
        TOPIC_MAP.get(topic).copied()
    }

    /// Topic[0] correspondente à assinatura
    pub fn topic(&self) -> H256 {
        SIGNATURE_TABLE
            .iter()
            .find(|(sig, _)| sig == self)
            .and_then(|(_, hex)| hex_to_h256(hex))
            .unwrap_or_default()
    }

    fn payload_layout(&self) -> Vec<ParamType> {
        match self {
            EventSignature::AaveFlashLoan => vec![ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(256)],
            EventSignature::BalancerFlashLoan => vec![ParamType::Uint(256), ParamType::Uint(256)],
            EventSignature::Liquidation => vec![ParamType::Address, ParamType::Uint(256), ParamType::Uint(256)],
            EventSignature::Withdraw => vec![ParamType::Uint(256)],
            EventSignature::Donate
            | EventSignature::Borrow
            | EventSignature::Repay
            | EventSignature::Transfer => Vec::new(),
        }
    }

    /// Decodifica o log de acordo com a assinatura
    pub fn decode(&self, log: &LogEntry) -> Result<LogEvent> {
        match self {
            EventSignature::Donate => Ok(LogEvent::Donate),
            EventSignature::Borrow | EventSignature::Repay => Ok(LogEvent::SkipNextTransfer),
            EventSignature::Transfer => Ok(LogEvent::Transfer {
                from: log.topics.get(1).copied(),
                to: log.topics.get(2).copied(),
                amount: (!log.data.is_empty()).then(|| bytes_to_bigint(&log.data)),
            }),
            EventSignature::AaveFlashLoan | EventSignature::BalancerFlashLoan => {
                let tokens = self.decode_payload(log)?;
                Ok(LogEvent::FlashLoan {
                    amount: uint_at(&tokens, 0)?,
                    fee: uint_at(&tokens, 1)?,
                })
            }
            EventSignature::Liquidation => {
                let tokens = self.decode_payload(log)?;
                let collateral = tokens
                    .first()
                    .cloned()
                    .and_then(Token::into_address)
                    .ok_or_else(|| Error::DecodeError("colateral ausente na liquidação".into()))?;
                Ok(LogEvent::Liquidation {
                    collateral,
                    repay: uint_at(&tokens, 1)?,
                    yield_amount: uint_at(&tokens, 2)?,
                })
            }
            EventSignature::Withdraw => {
                let tokens = self.decode_payload(log)?;
                Ok(LogEvent::Withdraw { amount: uint_at(&tokens, 0)? })
            }
        }
    }

    fn decode_payload(&self, log: &LogEntry) -> Result<Vec<Token>> {
        decode(&self.payload_layout(), &log.data)
            .map_err(|e| Error::DecodeError(format!("payload inválido para {:?}: {}", self, e)))
    }
}

fn uint_at(tokens: &[Token], index: usize) -> Result<BigInt> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .map(|v| u256_to_bigint(&v))
        .ok_or_else(|| Error::DecodeError(format!("uint256 ausente na posição {}", index)))
}
