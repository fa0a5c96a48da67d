use ethernity_core::error::{Error, Result};
use parking_lot::RwLock;
use prometheus::{proto::MetricFamily, Encoder, Gauge, IntCounter, Registry, TextEncoder};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// Métricas de qualidade e desempenho da detecção, exportadas via Prometheus.
///
/// Os hashes de referência (ground truth) são comparados em minúsculas.
pub struct DetectionMetrics {
    registry: Registry,
    requests: IntCounter,
    attacks_detected: IntCounter,
    processing_duration: Gauge,
    true_positives: IntCounter,
    false_positives: IntCounter,
    false_negatives: IntCounter,
    f1_score: Gauge,
    ground_truth: RwLock<HashSet<String>>,
}

/// Visão serializável das métricas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub attacks_detected: u64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub processing_duration_seconds: f64,
}

/// Cronômetro devolvido por [`DetectionMetrics::start_timer`]
#[derive(Debug, Clone, Copy)]
pub struct DetectionTimer(Instant);

fn metric_error(e: prometheus::Error) -> Error {
    Error::Other(format!("Falha ao registrar métrica: {}", e))
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::new(name, help).map_err(metric_error)?;
    registry.register(Box::new(counter.clone())).map_err(metric_error)?;
    Ok(counter)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge> {
    let gauge = Gauge::new(name, help).map_err(metric_error)?;
    registry.register(Box::new(gauge.clone())).map_err(metric_error)?;
    Ok(gauge)
}

impl DetectionMetrics {
    /// Cria as métricas em um registry próprio
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Registra as métricas no registry informado
    pub fn with_registry(registry: Registry) -> Result<Self> {
        Ok(Self {
            requests: counter(&registry, "flash_loan_detect_requests_total", "Total number of detection requests")?,
            attacks_detected: counter(
                &registry,
                "flash_loan_attacks_detected_total",
                "Total number of flash loan attacks detected",
            )?,
            processing_duration: gauge(
                &registry,
                "flash_loan_processing_duration_seconds",
                "Time taken to process detection request",
            )?,
            true_positives: counter(
                &registry,
                "flash_loan_true_positives_total",
                "Number of correctly identified flash loan attacks",
            )?,
            false_positives: counter(
                &registry,
                "flash_loan_false_positives_total",
                "Number of incorrectly identified flash loan attacks",
            )?,
            false_negatives: counter(&registry, "flash_loan_false_negatives_total", "Number of missed flash loan attacks")?,
            f1_score: gauge(&registry, "flash_loan_f1_score", "F1 score of the flash loan detection model")?,
            ground_truth: RwLock::new(HashSet::new()),
            registry,
        })
    }

    pub fn with_ground_truth<I, S>(hashes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metrics = Self::new()?;
        metrics.set_ground_truth(hashes);
        Ok(metrics)
    }

    /// Substitui o conjunto de transações sabidamente maliciosas
    pub fn set_ground_truth<I, S>(&self, hashes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        *self.ground_truth.write() = hashes.into_iter().map(|h| h.as_ref().to_lowercase()).collect();
    }

    fn is_known_attack(&self, tx_hash: &str) -> bool {
        self.ground_truth.read().contains(&tx_hash.to_lowercase())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn increment_requests(&self) {
        self.requests.inc();
    }

    pub fn add_attacks_detected(&self, count: u64) {
        self.attacks_detected.inc_by(count);
    }

    /// Classifica uma detecção como verdadeiro ou falso positivo
    pub fn verify_detection(&self, tx_hash: &str) {
        if self.is_known_attack(tx_hash) {
            self.true_positives.inc();
        } else {
            self.false_positives.inc();
        }
        self.update_f1_score();
    }

    /// Conta um falso negativo para um ataque conhecido que não foi reportado
    pub fn verify_false_negative(&self, tx_hash: &str) {
        if self.is_known_attack(tx_hash) {
            self.false_negatives.inc();
            self.update_f1_score();
        }
    }

    fn update_f1_score(&self) {
        let (p, r) = (self.precision(), self.recall());
        self.f1_score.set(ratio(2.0 * p * r, p + r));
    }

    pub fn start_timer(&self) -> DetectionTimer {
        DetectionTimer(Instant::now())
    }

    /// Grava a duração da detecção iniciada por `timer`
    pub fn record_detection_time(&self, timer: DetectionTimer) {
        self.processing_duration.set(timer.0.elapsed().as_secs_f64());
    }

    pub fn precision(&self) -> f64 {
        let tp = self.true_positives.get() as f64;
        ratio(tp, tp + self.false_positives.get() as f64)
    }

    pub fn recall(&self) -> f64 {
        let tp = self.true_positives.get() as f64;
        ratio(tp, tp + self.false_negatives.get() as f64)
    }

    pub fn f1_score(&self) -> f64 {
        self.f1_score.get()
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Exporta o registry no formato texto do Prometheus
    pub fn encode(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.gather(), &mut buf)
            .map_err(|e| Error::Other(format!("Falha ao exportar métricas: {}", e)))?;
        String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.get(),
            attacks_detected: self.attacks_detected.get(),
            true_positives: self.true_positives.get(),
            false_positives: self.false_positives.get(),
            false_negatives: self.false_negatives.get(),
            precision: self.precision(),
            recall: self.recall(),
            f1_score: self.f1_score(),
            processing_duration_seconds: self.processing_duration.get(),
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metrics_report_zero_scores() {
        let snapshot = DetectionMetrics::new().unwrap().snapshot();
        assert_eq!(snapshot.precision, 0.0);
        assert_eq!(snapshot.recall, 0.0);
        assert_eq!(snapshot.f1_score, 0.0);
    }

    #[test]
    fn f1_gauge_follows_every_update() {
        let metrics = DetectionMetrics::with_ground_truth(["0xAA", "0xbb", "0xcc"]).unwrap();
        metrics.verify_detection("0xaa");
        assert_eq!(metrics.f1_score(), 1.0);

        metrics.verify_detection("0xBB");
        metrics.verify_detection("0xdd");
        metrics.verify_false_negative("0xcc");
        metrics.verify_false_negative("0xee");

        let s = metrics.snapshot();
        assert_eq!((s.true_positives, s.false_positives, s.false_negatives), (2, 1, 1));
        assert!((s.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.f1_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn text_export_uses_flash_loan_metric_names() {
        let metrics = DetectionMetrics::new().unwrap();
        metrics.increment_requests();
        metrics.add_attacks_detected(3);
        metrics.record_detection_time(metrics.start_timer());

        let text = metrics.encode().unwrap();
        assert!(text.contains("flash_loan_detect_requests_total 1"));
        assert!(text.contains("flash_loan_attacks_detected_total 3"));
        for name in [
            "flash_loan_processing_duration_seconds",
            "flash_loan_true_positives_total",
            "flash_loan_false_positives_total",
            "flash_loan_false_negatives_total",
            "flash_loan_f1_score",
        ] {
            assert!(text.contains(name), "{} ausente", name);
        }
        assert_eq!(metrics.gather().len(), 7);
    }

    #[test]
    fn shared_registry_rejects_duplicate_registration() {
        let registry = Registry::new();
        assert!(DetectionMetrics::with_registry(registry.clone()).is_ok());
        assert!(matches!(DetectionMetrics::with_registry(registry), Err(Error::Other(_))));
    }

    #[test]
    fn snapshot_serializes_in_camel_case() {
        let metrics = DetectionMetrics::new().unwrap();
        metrics.increment_requests();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["requests"], 1);
        assert!(json.get("f1Score").is_some());
        assert!(json.get("processingDurationSeconds").is_some());
    }
}
