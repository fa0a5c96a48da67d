use crate::ledger::TokenFlowLedger;
use crate::signatures::{EventSignature, LogEvent};
use ethereum_types::{Address, H256};
use ethernity_core::types::{LogEntry, TxReceipt};
use num_bigint::BigInt;
use tracing::debug;

/// Sinais acumulados durante a varredura dos logs de uma transação
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExploitSignals {
    pub flash_loan: bool,
    pub donate: bool,
    pub liquidation: bool,
    /// Consumido pela próxima transferência (efeito colateral de borrow/repay)
    pub skip_next_transfer: bool,
}

impl ExploitSignals {
    /// Os três sinais persistentes do padrão estão presentes
    pub fn all_present(&self) -> bool {
        self.flash_loan && self.donate && self.liquidation
    }
}

/// Resultado da classificação de um recibo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub signals: ExploitSignals,
    pub ledger: TokenFlowLedger,
    /// Soma dos saques menos (valor - taxa) de cada flash loan
    pub loan_accumulator: BigInt,
    /// Colateral informado pelo último evento de liquidação
    pub liquidation_token: Option<Address>,
}

impl Classification {
    fn apply(&mut self, token: Address, event: LogEvent) {
        match event {
            LogEvent::FlashLoan { amount, fee } => {
                self.signals.flash_loan = true;
                self.loan_accumulator -= amount - fee;
            }
            LogEvent::Donate => self.signals.donate = true,
            LogEvent::SkipNextTransfer => self.signals.skip_next_transfer = true,
            LogEvent::Liquidation { collateral, .. } => {
                self.signals.liquidation = true;
                self.liquidation_token = Some(collateral);
            }
            LogEvent::Withdraw { amount } => self.loan_accumulator += amount,
            LogEvent::Transfer { from, to, amount } => {
                if self.signals.skip_next_transfer {
                    self.signals.skip_next_transfer = false;
                    return;
                }
                let Some(amount) = amount else { return };
                if from == Some(H256::zero()) {
                    self.ledger.credit(token, &amount);
                } else if to == Some(H256::zero()) {
                    self.ledger.debit(token, &amount);
                }
            }
        }
    }
}

/// Classificador de padrões de log em uma única passada
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPatternClassifier;

impl LogPatternClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifica todos os logs de um recibo
    pub fn classify(&self, receipt: &TxReceipt) -> Classification {
        self.classify_logs(&receipt.logs)
    }

    /// Classifica uma sequência de logs na ordem em que foram emitidos
    pub fn classify_logs(&self, logs: &[LogEntry]) -> Classification {
        let mut classification = Classification::default();
        for (log_index, log) in logs.iter().enumerate() {
            let Some(signature) = log.signature().and_then(EventSignature::from_topic) else {
                continue;
            };
            match signature.decode(log) {
                Ok(event) => classification.apply(log.address, event),
                Err(e) => debug!(log_index, ?signature, error = %e, "log ignorado"),
            }
        }
        classification
    }
}
