use crate::classifier::Classification;
use ethereum_types::Address;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

/// Veredito da regra de decisão para uma transação
#[derive(Debug, Clone, PartialEq)]
pub struct ExploitVerdict {
    pub attacked: bool,
    pub is_flash_loan: bool,
    pub liquidation_token: Option<Address>,
    pub victim_token: Option<Address>,
    pub loss_amount: BigInt,
}

impl ExploitVerdict {
    /// Veredito negativo, com todos os campos vazios
    pub fn clean() -> Self {
        Self {
            attacked: false,
            is_flash_loan: false,
            liquidation_token: None,
            victim_token: None,
            loss_amount: BigInt::zero(),
        }
    }
}

impl Default for ExploitVerdict {
    fn default() -> Self {
        Self::clean()
    }
}

/// Combina sinais, ledger e acumulador em um veredito.
///
/// Positivo somente com flash loan, doação e liquidação presentes, ledger não
/// vazio e acumulador não negativo.
pub fn decide(classification: &Classification) -> ExploitVerdict {
    let qualifies = classification.signals.all_present()
        && !classification.ledger.is_empty()
        && !classification.loan_accumulator.is_negative();
    if !qualifies {
        return ExploitVerdict::clean();
    }

    ExploitVerdict {
        attacked: true,
        is_flash_loan: classification.signals.flash_loan,
        liquidation_token: classification.liquidation_token,
        victim_token: classification.ledger.top_token(),
        loss_amount: classification.loan_accumulator.clone(),
    }
}
