/*
[INPUT]:  SignInInput fields, or the signed message text
[OUTPUT]: Canonical Sign-In With Solana message text and its parsed form
[POS]:    SIWS layer - message construction and parsing
[UPDATE]: When fields are added to the sign-in message
*/

use std::fmt;

use crate::error::{Result, SignInError};
use crate::types::SignInInput;

const HEADER_SUFFIX: &str = " wants you to sign in with your Solana account:";
const URI: &str = "URI: ";
const VERSION: &str = "Version: ";
const CHAIN_ID: &str = "Chain ID: ";
const NONCE: &str = "Nonce: ";
const ISSUED_AT: &str = "Issued At: ";
const EXPIRATION_TIME: &str = "Expiration Time: ";
const NOT_BEFORE: &str = "Not Before: ";
const REQUEST_ID: &str = "Request ID: ";
const RESOURCES: &str = "Resources:";
const RESOURCE_ITEM: &str = "- ";

const FIELD_PREFIXES: [&str; 9] = [
    URI,
    VERSION,
    CHAIN_ID,
    NONCE,
    ISSUED_AT,
    EXPIRATION_TIME,
    NOT_BEFORE,
    REQUEST_ID,
    RESOURCES,
];

/// Structured Sign-In With Solana message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInMessage {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: Option<String>,
    pub version: Option<String>,
    pub chain_id: Option<String>,
    pub nonce: Option<String>,
    pub issued_at: Option<String>,
    pub expiration_time: Option<String>,
    pub not_before: Option<String>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

impl SignInMessage {
    /// Build the message a wallet signs for `input`.
    ///
    /// `fallback_domain` is used when the input has no domain (wallets fill
    /// it from the requesting origin).
    pub fn from_input(
        input: &SignInInput,
        address: &str,
        fallback_domain: Option<&str>,
    ) -> Result<Self> {
        let config = &input.config;
        let domain = config
            .domain
            .as_deref()
            .or(fallback_domain)
            .ok_or_else(|| SignInError::Config("Sign-in input is missing a domain".to_string()))?;

        let single_line = [
            ("domain", Some(domain)),
            ("address", Some(address)),
            ("statement", config.statement.as_deref()),
            ("uri", config.uri.as_deref()),
            ("version", config.version.as_deref()),
            ("chainId", config.chain_id.as_deref()),
            ("nonce", config.nonce.as_deref()),
            ("issuedAt", config.issued_at.as_deref()),
            ("expirationTime", config.expiration_time.as_deref()),
            ("notBefore", config.not_before.as_deref()),
            ("requestId", config.request_id.as_deref()),
        ];
        let resources = config.resources.iter().flatten().map(|r| ("resources", Some(r.as_str())));
        for (name, value) in single_line.into_iter().chain(resources) {
            if value.is_some_and(|value| value.contains(['\n', '\r'])) {
                return Err(SignInError::Config(format!(
                    "Sign-in {name} must be a single line"
                )));
            }
        }
        // A statement read back as a field line would not round-trip.
        if config.statement.as_deref().is_some_and(is_field_line) {
            return Err(SignInError::Config(
                "Sign-in statement must not start with a field label".to_string(),
            ));
        }

        Ok(Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement: config.statement.clone(),
            uri: config.uri.clone(),
            version: config.version.clone(),
            chain_id: config.chain_id.clone(),
            nonce: config.nonce.clone(),
            issued_at: config.issued_at.clone(),
            expiration_time: config.expiration_time.clone(),
            not_before: config.not_before.clone(),
            request_id: config.request_id.clone(),
            resources: config.resources.clone().unwrap_or_default(),
        })
    }

    pub fn format(&self) -> String {
        let mut message = format!("{}{HEADER_SUFFIX}\n{}", self.domain, self.address);

        if let Some(statement) = &self.statement {
            message.push_str("\n\n");
            message.push_str(statement);
        }

        let mut fields = Vec::new();
        let optional = [
            (URI, &self.uri),
            (VERSION, &self.version),
            (CHAIN_ID, &self.chain_id),
            (NONCE, &self.nonce),
            (ISSUED_AT, &self.issued_at),
            (EXPIRATION_TIME, &self.expiration_time),
            (NOT_BEFORE, &self.not_before),
            (REQUEST_ID, &self.request_id),
        ];
        for (prefix, value) in optional {
            if let Some(value) = value {
                fields.push(format!("{prefix}{value}"));
            }
        }
        if !self.resources.is_empty() {
            fields.push(RESOURCES.to_string());
            fields.extend(
                self.resources
                    .iter()
                    .map(|resource| format!("{RESOURCE_ITEM}{resource}")),
            );
        }

        if !fields.is_empty() {
            message.push_str("\n\n");
            message.push_str(&fields.join("\n"));
        }
        message
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.split('\n').peekable();

        let header = lines.next().unwrap_or_default();
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| malformed("missing sign-in header"))?;
        let address = lines
            .next()
            .filter(|address| !address.is_empty())
            .ok_or_else(|| malformed("missing address"))?;

        let mut message = Self {
            domain: domain.to_string(),
            address: address.to_string(),
            ..Self::default()
        };

        if lines.peek().is_none() {
            return Ok(message);
        }
        expect_blank(lines.next())?;

        let next = lines.next().ok_or_else(|| malformed("unexpected end of message"))?;
        let first_field = if is_field_line(next) {
            next
        } else {
            message.statement = Some(next.to_string());
            if lines.peek().is_none() {
                return Ok(message);
            }
            expect_blank(lines.next())?;
            lines.next().ok_or_else(|| malformed("unexpected end of message"))?
        };

        let mut current = Some(first_field);
        let mut in_resources = false;
        while let Some(line) = current {
            if in_resources {
                let resource = line
                    .strip_prefix(RESOURCE_ITEM)
                    .ok_or_else(|| malformed(&format!("unexpected line: {line}")))?;
                message.resources.push(resource.to_string());
            } else if line == RESOURCES {
                in_resources = true;
            } else {
                message.set_field(line)?;
            }
            current = lines.next();
        }

        Ok(message)
    }

    fn set_field(&mut self, line: &str) -> Result<()> {
        let slots = [
            (URI, &mut self.uri),
            (VERSION, &mut self.version),
            (CHAIN_ID, &mut self.chain_id),
            (NONCE, &mut self.nonce),
            (ISSUED_AT, &mut self.issued_at),
            (EXPIRATION_TIME, &mut self.expiration_time),
            (NOT_BEFORE, &mut self.not_before),
            (REQUEST_ID, &mut self.request_id),
        ];
        for (prefix, slot) in slots {
            if let Some(value) = line.strip_prefix(prefix) {
                if slot.is_some() {
                    return Err(malformed(&format!("duplicate field: {}", prefix.trim_end())));
                }
                *slot = Some(value.to_string());
                return Ok(());
            }
        }
        Err(malformed(&format!("unexpected line: {line}")))
    }
}

impl fmt::Display for SignInMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn is_field_line(line: &str) -> bool {
    FIELD_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn expect_blank(line: Option<&str>) -> Result<()> {
    match line {
        Some("") => Ok(()),
        Some(other) => Err(malformed(&format!("expected blank line, found: {other}"))),
        None => Err(malformed("unexpected end of message")),
    }
}

fn malformed(detail: &str) -> SignInError {
    SignInError::Verification(format!("malformed sign-in message: {detail}"))
}
