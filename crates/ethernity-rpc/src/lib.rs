/*!
 * Ethernity RPC
 *
 * Cliente RPC para interação com nodes Ethereum, com timeout por chamada,
 * retentativas com backoff exponencial e cache limitado de recibos.
 */

use async_trait::async_trait;
use ethereum_types::{Address, H256};
use ethernity_core::{
    error::Result,
    traits::ChainClient,
    types::{BlockData, LogEntry, TransactionHash, TxReceipt},
    Error,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use web3::{
    transports::{Http, WebSocket},
    types::{BlockId, BlockNumber, Bytes, CallRequest, H160, H256 as Web3H256, U64},
    Web3,
};

/// Configuração do cliente RPC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub endpoint: String,
    /// Timeout aplicado a cada tentativa
    pub timeout: Duration,
    pub max_retries: u32,
    /// Atraso inicial entre tentativas; dobra a cada falha
    pub retry_delay: Duration,
    pub receipt_cache_size: usize,
    /// Chamadas simultâneas permitidas contra o node
    pub max_in_flight: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8545".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            receipt_cache_size: 4096,
            max_in_flight: 16,
        }
    }
}

impl RpcConfig {
    /// Lê `ETH_RPC_URL` do ambiente, mantendo os demais valores padrão
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("ETH_RPC_URL") {
            config.endpoint = endpoint;
        }
        config
    }
}

/// Executa `operation` com timeout por tentativa e backoff exponencial.
///
/// Apenas erros transitórios ([`Error::is_transient`]) são repetidos.
pub async fn retry_with_backoff<T, F, Fut>(config: &RpcConfig, name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = config.retry_delay;
    let mut attempt = 0u32;
    loop {
        let outcome = match tokio::time::timeout(config.timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(Error::TimeoutError(format!("{} excedeu {:?}", name, config.timeout))),
        };
        match outcome {
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                warn!(operation = name, attempt, error = %e, "falha transitória, nova tentativa");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            other => return other,
        }
    }
}

/// Variante de [`retry_with_backoff`] limitada por `limiter`.
///
/// Cada tentativa ocupa uma vaga somente enquanto executa; a espera do
/// backoff ocorre sem vaga.
pub async fn retry_with_permits<T, F, Fut>(
    config: &RpcConfig,
    limiter: &Semaphore,
    name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(config, name, move || {
        let attempt = operation();
        async move {
            let _permit = limiter
                .acquire()
                .await
                .map_err(|e| Error::RpcError(format!("Limitador de chamadas fechado: {}", e)))?;
            attempt.await
        }
    })
    .await
}

/// Enum para diferentes tipos de transporte
pub enum TransportType {
    Http(Web3<Http>),
    WebSocket(Web3<WebSocket>),
}

/// Cliente RPC para Ethereum
pub struct EthernityRpcClient {
    transport: TransportType,
    config: RpcConfig,
    receipts: Mutex<LruCache<TransactionHash, TxReceipt>>,
    limiter: Semaphore,
}

impl EthernityRpcClient {
    /// Cria um novo cliente RPC HTTP
    pub async fn new_http(config: RpcConfig) -> Result<Self> {
        let transport = Http::new(&config.endpoint)
            .map_err(|e| Error::RpcError(format!("Falha ao conectar via HTTP: {}", e)))?;
        Self::connected(TransportType::Http(Web3::new(transport)), config).await
    }

    /// Cria um novo cliente RPC WebSocket
    pub async fn new_websocket(config: RpcConfig) -> Result<Self> {
        let transport = WebSocket::new(&config.endpoint)
            .await
            .map_err(|e| Error::RpcError(format!("Falha ao conectar via WebSocket: {}", e)))?;
        Self::connected(TransportType::WebSocket(Web3::new(transport)), config).await
    }

    /// Cria um novo cliente baseado na URL
    pub async fn new(config: RpcConfig) -> Result<Self> {
        if config.endpoint.starts_with("ws") {
            Self::new_websocket(config).await
        } else {
            Self::new_http(config).await
        }
    }

    async fn connected(transport: TransportType, config: RpcConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.receipt_cache_size).unwrap_or(NonZeroUsize::MIN);
        let client = Self {
            transport,
            receipts: Mutex::new(LruCache::new(capacity)),
            limiter: Semaphore::new(config.max_in_flight.max(1)),
            config,
        };

        // Verifica a conexão
        client.get_block_number().await?;
        Ok(client)
    }

    /// Obtém o número do bloco atual
    pub async fn get_block_number(&self) -> Result<u64> {
        retry_with_backoff(&self.config, "eth_blockNumber", move || async move {
            let number = match &self.transport {
                TransportType::Http(web3) => web3.eth().block_number().await,
                TransportType::WebSocket(web3) => web3.eth().block_number().await,
            };
            number
                .map(|n| n.as_u64())
                .map_err(|e| Error::RpcError(format!("Falha ao obter número do bloco: {}", e)))
        })
        .await
    }

    async fn fetch_block(&self, block_number: u64) -> Result<Option<BlockData>> {
        let id = BlockId::Number(BlockNumber::Number(U64::from(block_number)));
        let block = match &self.transport {
            TransportType::Http(web3) => web3.eth().block(id).await,
            TransportType::WebSocket(web3) => web3.eth().block(id).await,
        }
        .map_err(|e| Error::RpcError(format!("Falha ao obter bloco: {}", e)))?;

        Ok(block.map(|b| BlockData {
            number: b.number.map(|n| n.as_u64()).unwrap_or(block_number),
            timestamp: b.timestamp.low_u64(),
            transactions: b
                .transactions
                .iter()
                .map(|h| H256::from_slice(h.as_bytes()))
                .collect(),
        }))
    }

    async fn fetch_receipt(&self, tx_hash: TransactionHash) -> Result<Option<TxReceipt>> {
        let web3_hash = Web3H256::from_slice(tx_hash.as_bytes());
        let receipt = match &self.transport {
            TransportType::Http(web3) => web3.eth().transaction_receipt(web3_hash).await,
            TransportType::WebSocket(web3) => web3.eth().transaction_receipt(web3_hash).await,
        }
        .map_err(|e| Error::RpcError(format!("Falha ao obter recibo da transação: {}", e)))?;

        Ok(receipt.map(|r| TxReceipt {
            transaction_hash: H256::from_slice(r.transaction_hash.as_bytes()),
            from: Address::from_slice(r.from.as_bytes()),
            logs: r.logs.iter().map(convert_log).collect(),
        }))
    }

    async fn fetch_call(&self, to: Address, data: Vec<u8>, block: Option<u64>) -> Result<Vec<u8>> {
        let call_request = CallRequest {
            from: None,
            to: Some(H160::from_slice(to.as_bytes())),
            gas: None,
            gas_price: None,
            value: None,
            data: Some(Bytes(data)),
            transaction_type: None,
            access_list: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        };
        let block_id = block.map(|n| BlockId::Number(BlockNumber::Number(U64::from(n))));

        let result = match &self.transport {
            TransportType::Http(web3) => web3.eth().call(call_request, block_id).await,
            TransportType::WebSocket(web3) => web3.eth().call(call_request, block_id).await,
        }
        .map_err(|e| Error::RpcError(format!("Falha na chamada RPC: {}", e)))?;

        Ok(result.0)
    }

    /// Limpa o cache de recibos
    pub fn clear_cache(&self) {
        self.receipts.lock().clear();
    }

    /// Número de recibos em cache
    pub fn cached_receipts(&self) -> usize {
        self.receipts.lock().len()
    }
}

/// Converte um log do web3 para o tipo da workspace
pub fn convert_log(log: &web3::types::Log) -> LogEntry {
    LogEntry {
        address: Address::from_slice(log.address.as_bytes()),
        topics: log.topics.iter().map(|t| H256::from_slice(t.as_bytes())).collect(),
        data: log.data.0.clone(),
    }
}

#[async_trait]
impl ChainClient for EthernityRpcClient {
    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>> {
        retry_with_permits(&self.config, &self.limiter, "eth_getBlockByNumber", move || {
            self.fetch_block(block_number)
        })
        .await
    }

    async fn get_transaction_receipt(&self, tx_hash: TransactionHash) -> Result<Option<TxReceipt>> {
        let cached = self.receipts.lock().get(&tx_hash).cloned();
        if let Some(receipt) = cached {
            debug!(tx = ?tx_hash, "recibo servido do cache");
            return Ok(Some(receipt));
        }

        let receipt = retry_with_permits(&self.config, &self.limiter, "eth_getTransactionReceipt", move || {
            self.fetch_receipt(tx_hash)
        })
        .await?;

        if let Some(ref r) = receipt {
            self.receipts.lock().put(tx_hash, r.clone());
        }
        Ok(receipt)
    }

    async fn call(&self, to: Address, data: Vec<u8>, block: Option<u64>) -> Result<Vec<u8>> {
        retry_with_permits(&self.config, &self.limiter, "eth_call", move || {
            self.fetch_call(to, data.clone(), block)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> RpcConfig {
        RpcConfig {
            timeout: Duration::from_millis(50),
            max_retries,
            retry_delay: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(&fast_config(3), "test", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(Error::RpcError("conexão recusada".into()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_with_backoff(&fast_config(2), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::RpcError("indisponível".into()))
        })
        .await;
        assert!(matches!(result, Err(Error::RpcError(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_permanent_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_with_backoff(&fast_config(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::DecodeError("resposta inválida".into()))
        })
        .await;
        assert!(matches!(result, Err(Error::DecodeError(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out_and_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(&fast_config(1), "test", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(n)
        })
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permit_is_released_during_backoff() {
        let limiter = Semaphore::new(1);
        let config = RpcConfig {
            retry_delay: Duration::from_secs(1),
            ..fast_config(1)
        };
        let counter = AtomicU32::new(0);
        let busy = AtomicU32::new(0);
        let (calls, held, slots) = (&counter, &busy, &limiter);

        let retried = retry_with_permits(&config, &limiter, "test", move || async move {
            if slots.available_permits() == 0 {
                held.fetch_add(1, Ordering::SeqCst);
            }
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::RpcError("conexão recusada".into()))
            } else {
                Ok(())
            }
        });
        let during_backoff = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            limiter.available_permits()
        };

        let (result, free) = tokio::join!(retried, during_backoff);
        assert!(result.is_ok());
        assert_eq!(free, 1);
        assert_eq!(busy.load(Ordering::SeqCst), 2);
        assert_eq!(limiter.available_permits(), 1);
    }

    #[test]
    fn converts_web3_log() {
        let log: web3::types::Log = serde_json::from_value(serde_json::json!({
            "address": "0x0000000000000000000000000000000000000001",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x05"
        }))
        .unwrap();
        let entry = convert_log(&log);
        assert_eq!(entry.address, Address::from_low_u64_be(1));
        assert_eq!(entry.topics.len(), 1);
        assert_eq!(entry.data, vec![0x05]);
    }
}
