use crate::classifier::LogPatternClassifier;
use crate::config::DetectorConfig;
use crate::decision::{decide, ExploitVerdict};
use crate::oracle::PriceOracle;
use crate::token::TokenMetadata;
use ethereum_types::Address;
use ethernity_core::{
    error::{Error, Result},
    traits::ChainClient,
    types::{Attack, BlockData, ExploitInfo, Severity, TransactionHash, TxReceipt},
    utils::{format_address, format_h256, format_timestamp, token_amount_to_f64},
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Agregador que percorre as transações de um bloco e monta o [`ExploitInfo`]
pub struct ExploitDetector {
    client: Arc<dyn ChainClient>,
    oracle: Arc<dyn PriceOracle>,
    tokens: Arc<dyn TokenMetadata>,
    classifier: LogPatternClassifier,
    config: DetectorConfig,
}

impl ExploitDetector {
    pub fn new(
        client: Arc<dyn ChainClient>,
        oracle: Arc<dyn PriceOracle>,
        tokens: Arc<dyn TokenMetadata>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            client,
            oracle,
            tokens,
            classifier: LogPatternClassifier::new(),
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analisa um bloco inteiro
    pub async fn detect(&self, block_number: u64) -> Result<ExploitInfo> {
        self.detect_with_cancel(block_number, &CancellationToken::new()).await
    }

    /// Analisa um bloco, abortando todas as transações em andamento se `cancel` disparar
    pub async fn detect_with_cancel(&self, block_number: u64, cancel: &CancellationToken) -> Result<ExploitInfo> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(block_number, "detecção cancelada");
                Err(Error::Cancelled)
            }
            result = self.scan_block(block_number) => result,
        }
    }

    async fn scan_block(&self, block_number: u64) -> Result<ExploitInfo> {
        let block = self
            .client
            .get_block(block_number)
            .await?
            .ok_or(Error::BlockNotFound(block_number))?;

        let attacks: Vec<Attack> = stream::iter(block.transactions.iter().copied())
            .map(|tx_hash| self.inspect_transaction(tx_hash, &block))
            .buffered(self.config.max_concurrency.max(1))
            .filter_map(futures::future::ready)
            .collect()
            .await;

        info!(
            block_number,
            transactions = block.transactions.len(),
            attacks = attacks.len(),
            "bloco analisado"
        );
        Ok(ExploitInfo::new(block_number, self.config.chain_id_hex(), attacks))
    }

    async fn inspect_transaction(&self, tx_hash: TransactionHash, block: &BlockData) -> Option<Attack> {
        let receipt = match self.client.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                debug!(error = %Error::ReceiptMissing(format_h256(&tx_hash)), "transação ignorada");
                return None;
            }
            Err(e) => {
                warn!(tx = %format_h256(&tx_hash), error = %e, "falha ao obter recibo, transação ignorada");
                return None;
            }
        };

        let verdict = decide(&self.classifier.classify(&receipt));
        if !verdict.attacked {
            return None;
        }
        self.assess(&receipt, verdict, block).await
    }

    /// Converte um veredito positivo em [`Attack`], resolvendo decimais e preço
    pub async fn assess(&self, receipt: &TxReceipt, verdict: ExploitVerdict, block: &BlockData) -> Option<Attack> {
        // decimais e preço sempre do token vítima
        let victim = verdict.victim_token?;

        let (decimals, price) = tokio::join!(
            self.resolve_decimals(victim),
            self.oracle.get_price(&verdict.loss_amount, victim, block.number),
        );

        let amount_lost = token_amount_to_f64(&verdict.loss_amount, decimals);
        let amount_lost_in_dollars = if price > 0.0 { amount_lost * price } else { 0.0 };
        let severity = Severity::from_loss(amount_lost_in_dollars, self.config.high_severity_threshold_usd);

        let attack = Attack {
            tx_hash: format_h256(&receipt.transaction_hash),
            attack_time: format_timestamp(block.timestamp),
            is_flash_loan: verdict.is_flash_loan,
            attacker_address: format_address(&receipt.from),
            victim_address: format_address(&victim),
            amount_lost,
            token: format_address(&victim),
            amount_lost_in_dollars,
            severity,
        };
        info!(
            tx = %attack.tx_hash,
            victim = %attack.victim_address,
            collateral = ?verdict.liquidation_token,
            amount_lost,
            amount_lost_in_dollars,
            %severity,
            "ataque detectado"
        );
        Some(attack)
    }

    async fn resolve_decimals(&self, token: Address) -> u8 {
        match self.tokens.decimals(token).await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!(
                    ?token,
                    error = %Error::OracleUnavailable(e.to_string()),
                    default = self.config.default_decimals,
                    "decimais indisponíveis"
                );
                self.config.default_decimals
            }
        }
    }
}
