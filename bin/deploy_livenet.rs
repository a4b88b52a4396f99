//! Deploy the Phoenix protocol to Casper livenet/testnet using Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!   PHOENIX_COLLATERAL_TOKEN=hash-...        (CEP-18 collateral, e.g. USDT)
//!
//! Optional:
//!   PHOENIX_KEEPER=account-hash-...          (defaults to the deployer)
//!   PHOENIX_SUPPLY_CAP=1000000000            (whole USDS tokens)
//!   PHOENIX_DEPLOYMENT_FILE=deployment.json

use std::str::FromStr;

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;
use serde::Serialize;
use thiserror::Error;

use phoenix_protocol_contracts::access_control::{
    ROLE_BURNER, ROLE_KEEPER, ROLE_MINTER, ROLE_PAUSER,
};
use phoenix_protocol_contracts::collateral_vault::{CollateralVault, CollateralVaultInitArgs};
use phoenix_protocol_contracts::farm::{Farm, FarmInitArgs};
use phoenix_protocol_contracts::oracle_manager::{OracleManager, OracleManagerInitArgs};
use phoenix_protocol_contracts::pegged_token::{PeggedToken, PeggedTokenInitArgs};
use phoenix_protocol_contracts::types::PRICE_SCALE;

const DEFAULT_PAYMENT_AMOUNT: u64 = 200_000_000_000;
const DEFAULT_SUPPLY_CAP_TOKENS: u64 = 1_000_000_000;
const DEFAULT_DEPLOYMENT_FILE: &str = "deployment.json";

#[derive(Debug, Error)]
enum DeployError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
    #[error("failed to encode deployment record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write deployment record: {0}")]
    Io(#[from] std::io::Error),
}

/// Deployment parameters read from the environment
struct DeployConfig {
    payment_amount: u64,
    collateral_token: Address,
    keeper: Option<Address>,
    supply_cap: U256,
    deployment_file: String,
}

impl DeployConfig {
    fn from_env() -> Result<Self, DeployError> {
        let payment_amount = optional_var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT")
            .map(|v| parse_var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT", &v))
            .transpose()?
            .unwrap_or(DEFAULT_PAYMENT_AMOUNT);

        let collateral_token = std::env::var("PHOENIX_COLLATERAL_TOKEN")
            .map_err(|_| DeployError::MissingVar("PHOENIX_COLLATERAL_TOKEN"))
            .and_then(|v| parse_address("PHOENIX_COLLATERAL_TOKEN", &v))?;

        let keeper = optional_var("PHOENIX_KEEPER")
            .map(|v| parse_address("PHOENIX_KEEPER", &v))
            .transpose()?;

        let cap_tokens: u64 = optional_var("PHOENIX_SUPPLY_CAP")
            .map(|v| parse_var("PHOENIX_SUPPLY_CAP", &v))
            .transpose()?
            .unwrap_or(DEFAULT_SUPPLY_CAP_TOKENS);

        let deployment_file = optional_var("PHOENIX_DEPLOYMENT_FILE")
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT_FILE.to_string());

        Ok(Self {
            payment_amount,
            collateral_token,
            keeper,
            supply_cap: U256::from(cap_tokens) * U256::from(PRICE_SCALE),
            deployment_file,
        })
    }
}

/// Address book written after a successful deployment
#[derive(Debug, Serialize)]
struct DeploymentRecord {
    deployer: String,
    keeper: String,
    collateral_token: String,
    pegged_token: String,
    oracle_manager: String,
    collateral_vault: String,
    farm: String,
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, DeployError> {
    value.parse().map_err(|_| DeployError::InvalidVar {
        name,
        value: value.to_string(),
    })
}

fn parse_address(name: &'static str, value: &str) -> Result<Address, DeployError> {
    Address::from_str(value).map_err(|_| DeployError::InvalidVar {
        name,
        value: value.to_string(),
    })
}

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    if let Err(err) = run() {
        eprintln!("Deployment failed: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DeployError> {
    println!("=== Phoenix Protocol Livenet Deployment ===");
    println!();

    let config = DeployConfig::from_env()?;

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();
    env.set_gas(config.payment_amount);

    let deployer = env.caller();
    let keeper = config.keeper.unwrap_or(deployer);
    println!("Deployer: {:?}", deployer);
    println!("Keeper:   {:?}", keeper);
    println!("Collateral token: {:?}", config.collateral_token);
    println!();

    // ==================== Phase 1: Token and Oracle ====================
    println!("=== Phase 1: Deploying Token and Oracle ===");
    println!();

    println!("Deploying PeggedToken (USDS)...");
    let mut usds = PeggedToken::deploy(
        &env,
        PeggedTokenInitArgs {
            name: "Phoenix USD".to_string(),
            symbol: "USDS".to_string(),
            cap: config.supply_cap,
            admin: deployer,
        },
    );
    let usds_addr = usds.address().clone();
    println!("PeggedToken deployed at: {:?}", usds_addr);

    // Vault is bound once it exists
    println!("Deploying OracleManager...");
    let mut oracle = OracleManager::deploy(
        &env,
        OracleManagerInitArgs {
            vault: None,
            admin: deployer,
        },
    );
    let oracle_addr = oracle.address().clone();
    println!("OracleManager deployed at: {:?}", oracle_addr);

    println!();

    // ==================== Phase 2: Vault and Farm ====================
    println!("=== Phase 2: Deploying Vault and Farm ===");
    println!();

    println!("Deploying CollateralVault...");
    let mut vault = CollateralVault::deploy(
        &env,
        CollateralVaultInitArgs {
            collateral_token: config.collateral_token,
            pegged_token: usds_addr,
            oracle: oracle_addr,
            admin: deployer,
        },
    );
    let vault_addr = vault.address().clone();
    println!("CollateralVault deployed at: {:?}", vault_addr);

    println!("Deploying Farm...");
    let farm = Farm::deploy(
        &env,
        FarmInitArgs {
            pegged_token: usds_addr,
            vault: vault_addr,
            admin: deployer,
        },
    );
    let farm_addr = farm.address().clone();
    println!("Farm deployed at: {:?}", farm_addr);

    println!();

    // ==================== Phase 3: Wiring ====================
    println!("=== Phase 3: Cross-contract Configuration ===");
    println!();

    println!("Configuring OracleManager -> CollateralVault link...");
    oracle.set_vault(vault_addr);
    println!("Done.");

    println!("Configuring CollateralVault -> Farm link...");
    vault.set_farm_address(farm_addr);
    println!("Done.");

    println!("Granting USDS mint/burn roles...");
    usds.grant_role(ROLE_MINTER, vault_addr);
    usds.grant_role(ROLE_BURNER, vault_addr);
    usds.grant_role(ROLE_BURNER, farm_addr);
    println!("Done.");

    println!("Granting circuit breaker and keeper roles...");
    vault.grant_role(ROLE_PAUSER, oracle_addr);
    oracle.grant_role(ROLE_KEEPER, keeper);
    println!("Done.");

    println!();

    let record = DeploymentRecord {
        deployer: deployer.to_formatted_string(),
        keeper: keeper.to_formatted_string(),
        collateral_token: config.collateral_token.to_formatted_string(),
        pegged_token: usds_addr.to_formatted_string(),
        oracle_manager: oracle_addr.to_formatted_string(),
        collateral_vault: vault_addr.to_formatted_string(),
        farm: farm_addr.to_formatted_string(),
    };
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(&config.deployment_file, json)?;

    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  PeggedToken:      {:?}", usds_addr);
    println!("  OracleManager:    {:?}", oracle_addr);
    println!("  CollateralVault:  {:?}", vault_addr);
    println!("  Farm:             {:?}", farm_addr);
    println!();
    println!("Address book written to {}", config.deployment_file);
    println!("Keeper must publish a price before the first mint.");

    Ok(())
}
