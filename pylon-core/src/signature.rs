//! Parsing for the HTTP `signature` request header.
//!
//! Inbound federation traffic carries a cavage-style signature header:
//!
//! ```text
//! keyId="https://example.com/actor#main-key",algorithm="rsa-sha256",
//! headers="(request-target) host date digest",signature="R0a3..."
//! ```
//!
//! Verifying the signature against the signing key is the transport
//! layer's job and out of scope here; this module only extracts the
//! structured fields so the request context can expose them.

use base64::Engine as _;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header: {0}")]
    Malformed(String),

    #[error("signature header is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("signature value is not valid base64")]
    InvalidEncoding,
}

/// Structured view of a parsed `signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// URL of the signing key, usually `<actor id>#main-key`.
    pub key_id: String,
    pub algorithm: Option<String>,
    /// Header names covered by the signature, in signing order.
    pub headers: Vec<String>,
    /// The base64 signature blob, kept encoded.
    pub signature: String,
}

impl Signature {
    /// Parse a raw header value into its structured fields.
    ///
    /// `keyId` and `signature` are required; `headers` defaults to
    /// `date` per the cavage draft when absent. The signature blob is
    /// checked to be valid base64 but left encoded.
    pub fn parse(raw: &str) -> Result<Self, SignatureError> {
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers = None;
        let mut signature = None;

        for (key, value) in split_pairs(raw)? {
            match key.as_str() {
                "keyId" => key_id = Some(value),
                "algorithm" => algorithm = Some(value),
                "headers" => {
                    headers = Some(
                        value
                            .split_whitespace()
                            .map(str::to_owned)
                            .collect::<Vec<_>>(),
                    )
                }
                "signature" => signature = Some(value),
                // Unknown parameters are ignored for forward compatibility.
                _ => {}
            }
        }

        let key_id = key_id.ok_or(SignatureError::MissingField("keyId"))?;
        let signature = signature.ok_or(SignatureError::MissingField("signature"))?;

        if base64::engine::general_purpose::STANDARD
            .decode(signature.as_bytes())
            .is_err()
        {
            return Err(SignatureError::InvalidEncoding);
        }

        Ok(Self {
            key_id,
            algorithm,
            headers: headers.unwrap_or_else(|| vec!["date".to_owned()]),
            signature,
        })
    }

    /// Host portion of the signing key URL, when it has one.
    pub fn key_host(&self) -> Option<&str> {
        let rest = self.key_id.split_once("://")?.1;
        let host = rest.split(['/', '#', '?']).next()?;
        if host.is_empty() { None } else { Some(host) }
    }
}

/// Split `k="v",k="v"` pairs, tolerating commas inside quoted values.
fn split_pairs(raw: &str) -> Result<Vec<(String, String)>, SignatureError> {
    let mut pairs = Vec::new();
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| SignatureError::Malformed(format!("expected `=` in `{rest}`")))?;
        let key = rest[..eq].trim().to_owned();
        if key.is_empty() {
            return Err(SignatureError::Malformed("empty parameter name".into()));
        }

        let after = &rest[eq + 1..];
        if !after.starts_with('"') {
            return Err(SignatureError::Malformed(format!(
                "value for `{key}` is not quoted"
            )));
        }
        let close = after[1..]
            .find('"')
            .ok_or_else(|| SignatureError::Malformed(format!("unterminated value for `{key}`")))?;
        let value = after[1..1 + close].to_owned();
        pairs.push((key, value));

        rest = after[close + 2..].trim_start();
        if let Some(stripped) = rest.strip_prefix(',') {
            rest = stripped.trim_start();
        } else if !rest.is_empty() {
            return Err(SignatureError::Malformed(format!(
                "unexpected trailing content `{rest}`"
            )));
        }
    }

    Ok(pairs)
}
