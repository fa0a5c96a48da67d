use crate::cache::{CacheStats, DetectionCache};
use crate::config::ServiceConfig;
use crate::detector::ExploitDetector;
use crate::metrics::DetectionMetrics;
use ethernity_core::{
    error::{Error, Result},
    types::ExploitInfo,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Fachada por requisição: validação, cache de resultados e métricas
pub struct ExploitDetectionService {
    detector: ExploitDetector,
    cache: DetectionCache,
    metrics: Arc<DetectionMetrics>,
}

impl ExploitDetectionService {
    pub fn new(detector: ExploitDetector, config: ServiceConfig, metrics: Arc<DetectionMetrics>) -> Self {
        Self {
            detector,
            cache: DetectionCache::new(config.cache_capacity, config.cache_ttl),
            metrics,
        }
    }

    pub async fn detect(&self, block_number: u64) -> Result<ExploitInfo> {
        self.detect_with_cancel(block_number, &CancellationToken::new()).await
    }

    pub async fn detect_with_cancel(&self, block_number: u64, cancel: &CancellationToken) -> Result<ExploitInfo> {
        if block_number == 0 {
            return Err(Error::ValidationError("número de bloco deve ser positivo".into()));
        }
        self.metrics.increment_requests();

        if let Some(info) = self.cache.get(block_number) {
            debug!(block_number, "resultado servido do cache");
            return Ok(info);
        }

        let timer = self.metrics.start_timer();
        let info = self.detector.detect_with_cancel(block_number, cancel).await?;
        self.metrics.record_detection_time(timer);

        self.metrics.add_attacks_detected(info.attacks.len() as u64);
        for attack in &info.attacks {
            self.metrics.verify_detection(&attack.tx_hash);
        }
        self.cache.insert(block_number, info.clone());

        info!(block_number, presence_of_attack = info.presence_of_attack, "detecção concluída");
        Ok(info)
    }

    pub fn metrics(&self) -> &Arc<DetectionMetrics> {
        &self.metrics
    }

    /// Métricas no formato texto do Prometheus
    pub fn export_metrics(&self) -> Result<String> {
        self.metrics.encode()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn detector(&self) -> &ExploitDetector {
        &self.detector
    }
}
