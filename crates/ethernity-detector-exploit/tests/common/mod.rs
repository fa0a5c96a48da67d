#![allow(dead_code)]

use async_trait::async_trait;
use ethereum_types::{Address, H256, U256};
use ethernity_core::{
    error::{Error, Result},
    traits::ChainClient,
    types::{BlockData, LogEntry, TransactionHash, TxReceipt},
};
use ethernity_detector_exploit::{EventSignature, PriceOracle, TokenMetadata};
use ethers::abi::{encode, Token};
use num_bigint::BigInt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TIMESTAMP: u64 = 1678697423;
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

pub fn pool() -> Address {
    Address::repeat_byte(0x10)
}

pub fn victim_token() -> Address {
    Address::repeat_byte(0x6b)
}

pub fn collateral_token() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn attacker() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn tx(n: u8) -> TransactionHash {
    H256::repeat_byte(n)
}

fn topic_of(address: Address) -> H256 {
    H256::from(address)
}

fn uint(v: u128) -> Token {
    Token::Uint(U256::from(v))
}

pub fn aave_flash_loan(amount: u128, fee: u128) -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::AaveFlashLoan.topic()],
        data: encode(&[uint(amount), uint(fee), uint(0)]),
    }
}

pub fn balancer_flash_loan(amount: u128, fee: u128) -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::BalancerFlashLoan.topic()],
        data: encode(&[uint(amount), uint(fee)]),
    }
}

pub fn donate() -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::Donate.topic()],
        data: vec![],
    }
}

pub fn borrow() -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::Borrow.topic()],
        data: vec![],
    }
}

pub fn repay() -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::Repay.topic()],
        data: vec![],
    }
}

pub fn liquidation(collateral: Address, repay: u128, yield_amount: u128) -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::Liquidation.topic()],
        data: encode(&[Token::Address(collateral), uint(repay), uint(yield_amount)]),
    }
}

pub fn withdraw(amount: u128) -> LogEntry {
    LogEntry {
        address: pool(),
        topics: vec![EventSignature::Withdraw.topic()],
        data: encode(&[uint(amount)]),
    }
}

pub fn transfer(token: Address, from: Address, to: Address, amount: u128) -> LogEntry {
    LogEntry {
        address: token,
        topics: vec![EventSignature::Transfer.topic(), topic_of(from), topic_of(to)],
        data: encode(&[uint(amount)]),
    }
}

pub fn mint(token: Address, amount: u128) -> LogEntry {
    transfer(token, Address::zero(), attacker(), amount)
}

pub fn burn(token: Address, amount: u128) -> LogEntry {
    transfer(token, attacker(), Address::zero(), amount)
}

/// Sequência completa do padrão com perda igual a `loss` unidades brutas
pub fn exploit_logs(loss: u128) -> Vec<LogEntry> {
    let drawn = 10 * ONE_TOKEN;
    vec![
        aave_flash_loan(drawn, 0),
        donate(),
        liquidation(collateral_token(), 5, 7),
        mint(victim_token(), 500),
        withdraw(drawn + loss),
    ]
}

pub fn receipt(hash: TransactionHash, logs: Vec<LogEntry>) -> TxReceipt {
    TxReceipt {
        transaction_hash: hash,
        from: attacker(),
        logs,
    }
}

/// Cliente em memória com atrasos e falhas configuráveis
#[derive(Default)]
pub struct MockChainClient {
    pub blocks: HashMap<u64, BlockData>,
    pub receipts: HashMap<TransactionHash, TxReceipt>,
    pub failing: HashSet<TransactionHash>,
    pub delays: HashMap<TransactionHash, Duration>,
    pub call_responses: HashMap<[u8; 4], Vec<u8>>,
    pub block_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub calls: Mutex<Vec<(Address, Option<u64>)>>,
}

impl MockChainClient {
    pub fn with_block(number: u64, receipts: Vec<TxReceipt>) -> Self {
        let mut client = Self::default();
        client.blocks.insert(
            number,
            BlockData {
                number,
                timestamp: TIMESTAMP,
                transactions: receipts.iter().map(|r| r.transaction_hash).collect(),
            },
        );
        for r in receipts {
            client.receipts.insert(r.transaction_hash, r);
        }
        client
    }

    /// Adiciona uma transação ao bloco sem recibo correspondente
    pub fn add_orphan_tx(&mut self, number: u64, hash: TransactionHash) {
        if let Some(block) = self.blocks.get_mut(&number) {
            block.transactions.push(hash);
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_block(&self, block_number: u64) -> Result<Option<BlockData>> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blocks.get(&block_number).cloned())
    }

    async fn get_transaction_receipt(&self, tx_hash: TransactionHash) -> Result<Option<TxReceipt>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&tx_hash) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&tx_hash) {
            return Err(Error::RpcError("connection reset".into()));
        }
        Ok(self.receipts.get(&tx_hash).cloned())
    }

    async fn call(&self, to: Address, data: Vec<u8>, block: Option<u64>) -> Result<Vec<u8>> {
        self.calls.lock().push((to, block));
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::RpcError("calldata curto".into()))?;
        self.call_responses
            .get(&selector)
            .cloned()
            .ok_or_else(|| Error::RpcError("execution reverted".into()))
    }
}

/// Oráculo com preço fixo que registra as consultas
pub struct FixedPriceOracle {
    pub price: f64,
    pub requests: Mutex<Vec<(BigInt, Address, u64)>>,
}

impl FixedPriceOracle {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn get_price(&self, raw_amount: &BigInt, token: Address, block_number: u64) -> f64 {
        self.requests.lock().push((raw_amount.clone(), token, block_number));
        self.price
    }
}

/// Decimais por token; tokens ausentes falham
#[derive(Default)]
pub struct StaticDecimals {
    pub decimals: HashMap<Address, u8>,
}

impl StaticDecimals {
    pub fn with(token: Address, decimals: u8) -> Self {
        let mut map = HashMap::new();
        map.insert(token, decimals);
        Self { decimals: map }
    }
}

#[async_trait]
impl TokenMetadata for StaticDecimals {
    async fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| Error::RpcError(format!("decimals() falhou para {:?}", token)))
    }
}
