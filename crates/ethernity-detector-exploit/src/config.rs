use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuração do agregador de detecção
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Chain id reportado no resultado
    pub chain_id: u64,
    /// Transações processadas simultaneamente por bloco
    pub max_concurrency: usize,
    /// Decimais usados quando a consulta ao token falha
    pub default_decimals: u8,
    /// Perda em USD acima da qual a severidade é HIGH (exclusivo)
    pub high_severity_threshold_usd: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            max_concurrency: 8,
            default_decimals: 18,
            high_severity_threshold_usd: 1_000_000.0,
        }
    }
}

impl DetectorConfig {
    /// Lê `CHAIN_ID` e `DETECTOR_MAX_CONCURRENCY` do ambiente
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(chain_id) = std::env::var("CHAIN_ID").ok().and_then(|v| v.parse().ok()) {
            config.chain_id = chain_id;
        }
        if let Some(n) = std::env::var("DETECTOR_MAX_CONCURRENCY").ok().and_then(|v| v.parse().ok()) {
            config.max_concurrency = n;
        }
        config
    }

    /// Chain id no formato hexadecimal com prefixo
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }
}

/// Configuração do serviço de detecção por requisição
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Blocos mantidos no cache de resultados
    pub cache_capacity: usize,
    /// Validade das entradas; `None` mantém até a evicção
    pub cache_ttl: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1024,
            cache_ttl: None,
        }
    }
}
