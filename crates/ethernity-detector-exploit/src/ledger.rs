use ethereum_types::Address;
use num_bigint::BigInt;
use std::collections::HashMap;

/// Saldo líquido de mint/burn por token dentro de uma transação.
///
/// A ordem de iteração é a ordem em que cada token apareceu pela primeira vez,
/// o que torna o desempate de [`TokenFlowLedger::top_token`] determinístico.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenFlowLedger {
    entries: Vec<(Address, BigInt)>,
    index: HashMap<Address, usize>,
}

impl TokenFlowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, token: Address) -> &mut BigInt {
        let pos = match self.index.get(&token) {
            Some(pos) => *pos,
            None => {
                self.entries.push((token, BigInt::default()));
                self.index.insert(token, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Registra um mint
    pub fn credit(&mut self, token: Address, amount: &BigInt) {
        *self.slot(token) += amount;
    }

    /// Registra um burn
    pub fn debit(&mut self, token: Address, amount: &BigInt) {
        *self.slot(token) -= amount;
    }

    pub fn get(&self, token: &Address) -> Option<&BigInt> {
        self.index.get(token).map(|pos| &self.entries[*pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &BigInt)> {
        self.entries.iter().map(|(token, value)| (token, value))
    }

    /// Token com o maior saldo líquido; em empate vence o primeiro a atingir o máximo
    pub fn top_token(&self) -> Option<Address> {
        let mut best: Option<&(Address, BigInt)> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.1 <= current.1 => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(token, _)| *token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn credit_and_debit_accumulate() {
        let mut ledger = TokenFlowLedger::new();
        ledger.credit(token(1), &BigInt::from(100));
        ledger.debit(token(1), &BigInt::from(30));
        ledger.debit(token(2), &BigInt::from(5));
        assert_eq!(ledger.get(&token(1)), Some(&BigInt::from(70)));
        assert_eq!(ledger.get(&token(2)), Some(&BigInt::from(-5)));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn top_token_picks_greatest_value() {
        let mut ledger = TokenFlowLedger::new();
        ledger.credit(token(1), &BigInt::from(100));
        ledger.credit(token(2), &BigInt::from(500));
        ledger.debit(token(3), &BigInt::from(50));
        assert_eq!(ledger.top_token(), Some(token(2)));
    }

    #[test]
    fn top_token_tie_keeps_first_seen() {
        let mut ledger = TokenFlowLedger::new();
        ledger.credit(token(9), &BigInt::from(7));
        ledger.credit(token(3), &BigInt::from(7));
        assert_eq!(ledger.top_token(), Some(token(9)));
    }

    #[test]
    fn top_token_with_only_negative_values() {
        let mut ledger = TokenFlowLedger::new();
        ledger.debit(token(1), &BigInt::from(10));
        ledger.debit(token(2), &BigInt::from(3));
        assert_eq!(ledger.top_token(), Some(token(2)));
    }

    #[test]
    fn empty_ledger_has_no_top_token() {
        assert_eq!(TokenFlowLedger::new().top_token(), None);
    }
}
