/*!
 * Ethernity Traits
 *
 * Traits comuns usados em toda a workspace Ethernity
 */

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{BlockData, TransactionHash, TxReceipt};
use ethereum_types::Address;

/// Fonte de blocos e recibos consumida pela detecção
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Obtém um bloco com os hashes das transações; `None` se não existir
    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>>;

    /// Obtém o recibo de uma transação; `None` se ausente
    async fn get_transaction_receipt(&self, tx_hash: TransactionHash) -> Result<Option<TxReceipt>>;

    /// Executa `eth_call` contra um contrato, opcionalmente em uma altura de bloco
    async fn call(&self, to: Address, data: Vec<u8>, block: Option<u64>) -> Result<Vec<u8>>;
}
