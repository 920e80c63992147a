use anyhow::Result;
use near_workspaces::network::Sandbox;
use near_workspaces::{sandbox, Contract, Worker};
use std::fs;
use std::path::PathBuf;

pub async fn setup_sandbox() -> Result<Worker<Sandbox>> {
    let mut last_err = None;
    for attempt in 1..=6 {
        match sandbox().await {
            Ok(worker) => return Ok(worker),
            Err(e) => {
                last_err = Some(e);
                eprintln!(
                    "[setup_sandbox] Attempt {}/6 failed, retrying in 5s: {}",
                    attempt,
                    last_err.as_ref().unwrap()
                );
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
    Err(anyhow::anyhow!(
        "Failed to set up sandbox after 6 attempts: {}",
        last_err.unwrap()
    ))
}

/// Reads a contract wasm from the workspace target directory, trying the
/// plain cargo layout first and the cargo-near layout second.
pub fn load_wasm(crate_name: &str) -> Result<Vec<u8>> {
    let candidates = [
        PathBuf::from(format!(
            "../target/wasm32-unknown-unknown/release/{}.wasm",
            crate_name
        )),
        PathBuf::from(format!("../target/near/{0}/{0}.wasm", crate_name)),
    ];
    for path in &candidates {
        if let Ok(wasm) = fs::read(path) {
            return Ok(wasm);
        }
    }
    Err(anyhow::anyhow!(
        "Could not find {}.wasm in {:?}; build the contracts first",
        crate_name,
        candidates
    ))
}

pub async fn deploy_contract(worker: &Worker<Sandbox>, crate_name: &str) -> Result<Contract> {
    let wasm = load_wasm(crate_name)?;
    let contract = worker.dev_deploy(&wasm).await?;
    Ok(contract)
}
