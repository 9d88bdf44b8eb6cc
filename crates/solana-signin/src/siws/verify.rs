/*
[INPUT]:  Requested SignInInput and the wallet's SignInOutput
[OUTPUT]: Ok when the signed message matches the request and the signature is valid
[POS]:    SIWS layer - relying-party verification
[UPDATE]: When verification rules or signature schemes change
*/

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::{Result, SignInError};
use crate::types::{SignInInput, SignInOutput};

use super::SignInMessage;

/// Verify `output` against `input` using the current time
pub fn verify_sign_in(input: &SignInInput, output: &SignInOutput) -> Result<()> {
    verify_sign_in_at(input, output, Utc::now())
}

/// Verify `output` against `input` as of `now`
pub fn verify_sign_in_at(
    input: &SignInInput,
    output: &SignInOutput,
    now: DateTime<Utc>,
) -> Result<()> {
    let text = output
        .message_text()
        .ok_or_else(|| failed("signed message is not valid UTF-8"))?;
    let message = SignInMessage::parse(text)?;

    if message.address != output.account.address {
        return Err(failed("message address does not match the signing account"));
    }
    if let Some(address) = &input.address
        && address != &message.address
    {
        return Err(failed("message address does not match the requested address"));
    }

    let config = &input.config;
    let expected = [
        ("domain", config.domain.as_ref(), Some(&message.domain)),
        ("statement", config.statement.as_ref(), message.statement.as_ref()),
        ("uri", config.uri.as_ref(), message.uri.as_ref()),
        ("version", config.version.as_ref(), message.version.as_ref()),
        ("chain id", config.chain_id.as_ref(), message.chain_id.as_ref()),
        ("nonce", config.nonce.as_ref(), message.nonce.as_ref()),
        ("issued at", config.issued_at.as_ref(), message.issued_at.as_ref()),
        (
            "expiration time",
            config.expiration_time.as_ref(),
            message.expiration_time.as_ref(),
        ),
        ("not before", config.not_before.as_ref(), message.not_before.as_ref()),
        ("request id", config.request_id.as_ref(), message.request_id.as_ref()),
    ];
    for (name, requested, signed) in expected {
        if let Some(requested) = requested
            && signed != Some(requested)
        {
            return Err(failed(&format!("{name} does not match the request")));
        }
    }
    if let Some(resources) = &config.resources
        && resources != &message.resources
    {
        return Err(failed("resources do not match the request"));
    }

    if let Some(expiration) = &message.expiration_time
        && now >= parse_time("expiration time", expiration)?
    {
        return Err(failed("message has expired"));
    }
    if let Some(not_before) = &message.not_before
        && now < parse_time("not before", not_before)?
    {
        return Err(failed("message is not yet valid"));
    }

    verify_signature(output)
}

fn verify_signature(output: &SignInOutput) -> Result<()> {
    let public_key = if output.account.public_key.is_empty() {
        bs58::decode(&output.account.address)
            .into_vec()
            .map_err(|e| failed(&format!("invalid account address: {e}")))?
    } else {
        output.account.public_key.clone()
    };
    let public_key: [u8; 32] = public_key
        .as_slice()
        .try_into()
        .map_err(|_| failed("account public key must be 32 bytes"))?;
    let verifying_key =
        VerifyingKey::from_bytes(&public_key).map_err(|e| failed(&format!("invalid public key: {e}")))?;

    if bs58::encode(verifying_key.as_bytes()).into_string() != output.account.address {
        return Err(failed("account public key does not match its address"));
    }

    let signature = Signature::from_slice(&output.signature)
        .map_err(|e| failed(&format!("invalid signature encoding: {e}")))?;
    verifying_key
        .verify(&output.signed_message, &signature)
        .map_err(|_| failed("signature does not verify"))
}

fn parse_time(name: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| failed(&format!("invalid {name} timestamp {value}: {e}")))
}

fn failed(detail: &str) -> SignInError {
    SignInError::Verification(detail.to_string())
}
