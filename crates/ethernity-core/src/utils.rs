/*!
 * Ethernity Utils
 *
 * Utilitários comuns usados em toda a workspace Ethernity
 */

use chrono::{DateTime, Utc};
use ethereum_types::{Address, H256, U256};
use num_bigint::{BigInt, Sign};
use num_traits::Signed;
use std::str::FromStr;

/// Converte uma string hexadecimal para Address
pub fn hex_to_address(hex: &str) -> Option<Address> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    Address::from_str(hex_str).ok()
}

/// Converte uma string hexadecimal para H256
pub fn hex_to_h256(hex: &str) -> Option<H256> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    H256::from_str(hex_str).ok()
}

/// Formata um Address com checksum EIP-55
pub fn format_address(address: &Address) -> String {
    ethers::utils::to_checksum(address, None)
}

/// Formata um H256 para exibição
pub fn format_h256(hash: &H256) -> String {
    format!("0x{:x}", hash)
}

/// Interpreta bytes big-endian como inteiro sem sinal de precisão arbitrária
pub fn bytes_to_bigint(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

/// Converte U256 para BigInt
pub fn u256_to_bigint(value: &U256) -> BigInt {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    bytes_to_bigint(&buf)
}

/// Formata um valor inteiro com decimais para exibição
pub fn format_token_amount(amount: &BigInt, decimals: u8) -> String {
    let negative = amount.is_negative();
    let digits = amount.abs().to_string();
    let decimals = decimals as usize;

    let (integer_part, fractional_part) = if decimals == 0 {
        (digits, String::new())
    } else if digits.len() > decimals {
        let (int, frac) = digits.split_at(digits.len() - decimals);
        (int.to_string(), frac.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    // Remove zeros à direita
    let fractional_part = fractional_part.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };

    if fractional_part.is_empty() {
        format!("{}{}", sign, integer_part)
    } else {
        format!("{}{}.{}", sign, integer_part, fractional_part)
    }
}

/// Converte um valor inteiro com decimais para f64
pub fn token_amount_to_f64(amount: &BigInt, decimals: u8) -> f64 {
    format_token_amount(amount, decimals).parse().unwrap_or(0.0)
}

/// Formata um timestamp unix como ISO-8601 com milissegundos
pub fn format_timestamp(unix_seconds: u64) -> String {
    DateTime::<Utc>::from_timestamp(unix_seconds as i64, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_default()
}
