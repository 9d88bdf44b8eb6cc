/*
[INPUT]:  CLI arguments, optional YAML settings, base58 keypair
[OUTPUT]: Signed sign-in output as JSON, or the message that would be signed
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags or the sign-in flow
*/

mod approval;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use base64::{Engine, prelude::BASE64_STANDARD};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solana_signin::{
    AlwaysOnline, KeypairWallet, SharedConnection, SignInMessage, SignInOperation,
    SignInOutput, SignInSettings, WalletConnection, verify_sign_in,
};

use approval::TerminalApprover;

#[derive(Parser, Debug)]
#[command(name = "solana-signin", version, about = "Sign-In With Solana from the terminal")]
struct Cli {
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a local keypair and print the signed output
    SignIn {
        /// Base58 private key (32-byte seed or 64-byte keypair)
        #[arg(long, value_name = "BASE58")]
        keypair: String,
        #[arg(long = "config", value_name = "PATH")]
        config_path: Option<PathBuf>,
        /// Domain used when the config does not set one
        #[arg(long, default_value = "localhost")]
        origin: String,
        /// Approve without prompting
        #[arg(long)]
        yes: bool,
    },
    /// Print the message a wallet would be asked to sign
    Message {
        #[arg(long, value_name = "ADDRESS")]
        address: String,
        #[arg(long = "config", value_name = "PATH")]
        config_path: Option<PathBuf>,
        #[arg(long, default_value = "localhost")]
        origin: String,
    },
    /// Generate a new keypair and print its seed and address
    Keygen,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInReport<'a> {
    address: &'a str,
    message: &'a str,
    signature_base58: String,
    signature_base64: String,
    output: &'a SignInOutput,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::SignIn {
            keypair,
            config_path,
            origin,
            yes,
        } => sign_in(&keypair, config_path.as_deref(), &origin, yes).await,
        Command::Message {
            address,
            config_path,
            origin,
        } => print_message(&address, config_path.as_deref(), &origin),
        Command::Keygen => {
            let wallet = KeypairWallet::generate();
            println!("address: {}", wallet.address());
            println!("seed:    {}", wallet.seed_base58());
            Ok(())
        }
    }
}

async fn sign_in(keypair: &str, config_path: Option<&Path>, origin: &str, yes: bool) -> Result<()> {
    let settings = load_settings(config_path)?;

    let mut wallet = KeypairWallet::from_base58(keypair)
        .context("load keypair")?
        .with_origin(origin);
    if !yes {
        wallet = wallet.with_approver(Arc::new(TerminalApprover));
    }
    info!(address = wallet.address(), "keypair wallet ready");

    let connection = SharedConnection::new();
    connection.connect(Arc::new(wallet));
    let connection: Arc<dyn WalletConnection> = Arc::new(connection);

    let operation = SignInOperation::from_settings(connection, &settings, Arc::new(AlwaysOnline));
    let output = operation.sign_in().await.context("sign in")?;

    let request = operation.request_for(&output.account.address);
    verify_sign_in(&request, &output).context("verify sign-in output")?;
    info!(address = %output.account.address, "sign-in verified");

    let message = output
        .message_text()
        .ok_or_else(|| anyhow!("signed message is not valid UTF-8"))?;
    let report = SignInReport {
        address: &output.account.address,
        message,
        signature_base58: output.signature_base58(),
        signature_base64: BASE64_STANDARD.encode(&output.signature),
        output: &output,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize output")?
    );
    Ok(())
}

fn print_message(address: &str, config_path: Option<&Path>, origin: &str) -> Result<()> {
    let settings = load_settings(config_path)?;
    let input = settings.sign_in.to_input(address);
    let message =
        SignInMessage::from_input(&input, address, Some(origin)).context("build sign-in message")?;
    println!("{message}");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<SignInSettings> {
    match path {
        Some(path) => {
            let settings = SignInSettings::from_file(path).context("load config")?;
            info!(config_path = %path.display(), "configuration loaded");
            Ok(settings)
        }
        None => Ok(SignInSettings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign_in() {
        let args = Cli::try_parse_from([
            "solana-signin",
            "sign-in",
            "--keypair",
            "11111111111111111111111111111111",
            "--yes",
        ])
        .unwrap();

        match args.command {
            Command::SignIn {
                keypair,
                origin,
                yes,
                config_path,
            } => {
                assert_eq!(keypair, "11111111111111111111111111111111");
                assert_eq!(origin, "localhost");
                assert!(yes);
                assert!(config_path.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_print_message_without_config() {
        assert!(print_message("11111111111111111111111111111111", None, "localhost").is_ok());
    }
}
