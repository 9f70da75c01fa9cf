//! Command-line playground for Starknet typed-data signatures: derive a
//! key pair, hash a document, sign it, then verify locally or on-chain.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use starksign::{
    sign_message, verify_message, Felt, RemoteVerifier, RemoteVerificationError, Signature,
    SigningKey, TypedData, VerifyingKey,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sign and verify Starknet typed-data messages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the public key of a private key
    Keypair {
        #[arg(long)]
        private_key: Felt,
    },
    /// Hash a typed-data document, bound to a signer identity
    Hash {
        /// Path to the typed-data JSON document
        #[arg(long)]
        file: PathBuf,
        /// Account address or public key the hash is bound to
        #[arg(long)]
        signer: Felt,
    },
    /// Sign a typed-data document with a private key
    Sign {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        private_key: Felt,
    },
    /// Verify a signature locally against a public key
    Verify {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        public_key_x: Felt,
        #[arg(long)]
        public_key_y: Felt,
        #[arg(long)]
        r: Felt,
        #[arg(long)]
        s: Felt,
    },
    /// Verify a signature on-chain against a deployed account contract
    VerifyOnchain {
        #[arg(long)]
        file: PathBuf,
        /// Address of the account contract
        #[arg(long)]
        account: Felt,
        #[arg(long)]
        rpc_url: Url,
        #[arg(long)]
        r: Felt,
        #[arg(long)]
        s: Felt,
        /// Round-trip timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Keypair { private_key } => {
            let key = SigningKey::from_secret_scalar(private_key)?;
            let public = key.verifying_key();
            println!("public key x: {}", public.stark_key());
            println!("public key y: {}", public.point().y());
            println!("stark key:    {}", public.stark_key());
        }
        Command::Hash { file, signer } => {
            let typed_data = load_typed_data(&file)?;
            println!("message hash: {}", typed_data.message_hash(&signer)?);
        }
        Command::Sign { file, private_key } => {
            let typed_data = load_typed_data(&file)?;
            let key = SigningKey::from_secret_scalar(private_key)?;
            let public = key.verifying_key();
            let signature = sign_message(&typed_data, &key)?;
            println!("signer:       {}", public.stark_key());
            println!("message hash: {}", typed_data.message_hash(&public.stark_key())?);
            println!("r: {}", signature.r);
            println!("s: {}", signature.s);
        }
        Command::Verify {
            file,
            public_key_x,
            public_key_y,
            r,
            s,
        } => {
            let typed_data = load_typed_data(&file)?;
            let key = VerifyingKey::from_coordinates(public_key_x, public_key_y)
                .context("invalid public key")?;
            let valid = verify_message(&typed_data, &key, &Signature::new(r, s))?;
            report(valid);
        }
        Command::VerifyOnchain {
            file,
            account,
            rpc_url,
            r,
            s,
            timeout,
        } => {
            let typed_data = load_typed_data(&file)?;
            let verifier = RemoteVerifier::builder(rpc_url)
                .with_timeout(Duration::from_secs(timeout))
                .build()?;
            match verifier
                .verify_message(&typed_data, &account, &Signature::new(r, s))
                .await
            {
                Ok(valid) => report(valid),
                Err(RemoteVerificationError::AccountNotDeployed) => {
                    // the common first-run stumble: the wallet exists but
                    // the contract was never deployed
                    anyhow::bail!(
                        "the account contract is not deployed; deploy it before verifying on-chain"
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
    Ok(())
}

fn load_typed_data(path: &Path) -> Result<TypedData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&raw).context("could not parse the typed-data document")
}

fn report(valid: bool) {
    if valid {
        println!("signature is valid");
    } else {
        println!("signature is invalid");
    }
}
