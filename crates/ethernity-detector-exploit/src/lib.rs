/*!
 * Ethernity Detector Exploit
 *
 * Detecção por bloco do padrão flash loan + doação + liquidação
 * a partir dos logs dos recibos, com perda estimada em USD.
 */

mod signatures;
mod ledger;
mod classifier;
mod decision;
mod oracle;
mod token;
mod detector;
mod cache;
mod metrics;
mod config;
mod service;

pub use signatures::*;
pub use ledger::*;
pub use classifier::*;
pub use decision::*;
pub use oracle::*;
pub use token::*;
pub use detector::*;
pub use cache::*;
pub use metrics::*;
pub use config::*;
pub use service::*;
