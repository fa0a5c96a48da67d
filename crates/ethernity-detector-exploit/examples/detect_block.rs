use std::env;
use std::sync::Arc;

use ethernity_core::traits::ChainClient;
use ethernity_detector_exploit::*;
use ethernity_rpc::{EthernityRpcClient, RpcConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Uso: {} <BLOCO>  (endpoint via ETH_RPC_URL)", args[0]);
        std::process::exit(1);
    }
    let block_number: u64 = args[1].parse()?;

    let client: Arc<dyn ChainClient> = Arc::new(EthernityRpcClient::new(RpcConfig::from_env()).await?);
    let detector = ExploitDetector::new(
        client.clone(),
        Arc::new(ChainlinkPriceOracle::new(client.clone())),
        Arc::new(Erc20Metadata::new(client)),
        DetectorConfig::from_env(),
    );
    let metrics = Arc::new(DetectionMetrics::new()?);
    let service = ExploitDetectionService::new(detector, ServiceConfig::default(), metrics.clone());

    let info = service.detect(block_number).await?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    println!("{}", metrics.encode()?);
    Ok(())
}
