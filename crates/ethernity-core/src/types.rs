/*!
 * Ethernity Types
 *
 * Tipos comuns usados em toda a workspace Ethernity
 */

use ethereum_types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias para hash de transação
pub type TransactionHash = H256;

/// Log de evento emitido durante a execução de uma transação
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

impl LogEntry {
    /// Assinatura do evento (topic[0]), quando presente
    pub fn signature(&self) -> Option<&H256> {
        self.topics.first()
    }
}

/// Recibo de transação reduzido ao que a detecção consome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: TransactionHash,
    pub from: Address,
    pub logs: Vec<LogEntry>,
}

/// Bloco com a lista ordenada de hashes de transação
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub number: u64,
    /// Timestamp unix em segundos
    pub timestamp: u64,
    pub transactions: Vec<TransactionHash>,
}

/// Severidade de um ataque, calculada a partir da perda em dólares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    /// Classifica a perda; o limiar é exclusivo
    pub fn from_loss(amount_lost_in_dollars: f64, threshold: f64) -> Self {
        if amount_lost_in_dollars > threshold {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Ataque detectado em uma transação
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub tx_hash: String,
    pub attack_time: String,
    pub is_flash_loan: bool,
    pub attacker_address: String,
    pub victim_address: String,
    pub amount_lost: f64,
    pub token: String,
    pub amount_lost_in_dollars: f64,
    pub severity: Severity,
}

/// Resultado da detecção para um bloco
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploitInfo {
    pub block_number: u64,
    pub chain_id: String,
    pub presence_of_attack: bool,
    pub attacks: Vec<Attack>,
}

impl ExploitInfo {
    /// Monta o resultado derivando `presence_of_attack` da lista de ataques
    pub fn new(block_number: u64, chain_id: String, attacks: Vec<Attack>) -> Self {
        Self {
            block_number,
            chain_id,
            presence_of_attack: !attacks.is_empty(),
            attacks,
        }
    }
}
