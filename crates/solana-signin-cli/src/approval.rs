/*
[INPUT]:  Sign-in message text awaiting approval
[OUTPUT]: User's approve/deny decision from the terminal
[POS]:    CLI - interactive wallet prompt
[UPDATE]: When changing prompt wording or input handling
*/

use async_trait::async_trait;
use dialoguer::Confirm;
use solana_signin::Approver;
use tracing::warn;

/// Asks on the terminal before the keypair wallet signs anything
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalApprover;

#[async_trait]
impl Approver for TerminalApprover {
    async fn approve(&self, message: &str) -> bool {
        let message = message.to_string();
        let decision = tokio::task::spawn_blocking(move || {
            eprintln!("\n{message}\n");
            Confirm::new()
                .with_prompt("Approve this sign-in request?")
                .default(false)
                .interact()
        })
        .await;

        match decision {
            Ok(Ok(approved)) => approved,
            Ok(Err(err)) => {
                warn!(error = %err, "approval prompt failed; treating as denied");
                false
            }
            Err(err) => {
                warn!(error = %err, "approval prompt task failed; treating as denied");
                false
            }
        }
    }
}
