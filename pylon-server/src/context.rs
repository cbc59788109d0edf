//! Per-request security and content view.
//!
//! Every inbound request gets one [`RequestContext`], built by the
//! [`attach_request_context`] middleware and threaded to handlers
//! through axum's request extensions. Actor, instance, and message are
//! populated by upstream collaborators (verification middleware, the
//! inbox handler) and memoized on first set; the signature is parsed
//! lazily out of the raw `signature` header. A successful parse is
//! memoized for the life of the request. A missing or malformed header
//! yields `None` without caching the failure, so a later access parses
//! again — unlike the other three fields, which stick once set.

use std::sync::{Arc, OnceLock};

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use pylon_core::Signature;

pub struct RequestContext {
    raw_signature: Option<String>,
    actor: OnceLock<Value>,
    instance: OnceLock<Value>,
    message: OnceLock<Value>,
    signature: Mutex<Option<Signature>>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext").finish_non_exhaustive()
    }
}

impl RequestContext {
    pub fn new(raw_signature: Option<String>) -> Self {
        Self {
            raw_signature,
            actor: OnceLock::new(),
            instance: OnceLock::new(),
            message: OnceLock::new(),
            signature: Mutex::new(None),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let raw_signature = headers
            .get("signature")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Self::new(raw_signature)
    }

    /// Stored actor document, if a collaborator has populated it.
    pub fn actor(&self) -> Option<&Value> {
        self.actor.get()
    }

    /// Populate the actor; later calls are ignored, the first value
    /// sticks for the request's lifetime.
    pub fn set_actor(&self, actor: Value) {
        let _ = self.actor.set(actor);
    }

    pub fn instance(&self) -> Option<&Value> {
        self.instance.get()
    }

    pub fn set_instance(&self, instance: Value) {
        let _ = self.instance.set(instance);
    }

    pub fn message(&self) -> Option<&Value> {
        self.message.get()
    }

    pub fn set_message(&self, message: Value) {
        let _ = self.message.set(message);
    }

    /// Structured view of the `signature` header.
    ///
    /// Parsed on first access and memoized on success. Absence or a
    /// malformed header is reported as `None` and deliberately not
    /// cached; the next access re-attempts the parse.
    pub fn signature(&self) -> Option<Signature> {
        let mut cached = self.signature.lock();
        if let Some(signature) = cached.as_ref() {
            return Some(signature.clone());
        }

        let raw = self.raw_signature.as_deref()?;
        match Signature::parse(raw) {
            Ok(signature) => {
                *cached = Some(signature.clone());
                Some(signature)
            }
            Err(err) => {
                debug!(error = %err, "ignoring unparseable signature header");
                None
            }
        }
    }

    #[cfg(test)]
    fn has_cached_signature(&self) -> bool {
        self.signature.lock().is_some()
    }
}

/// Build the context once per inbound request and stash it in the
/// request extensions for handlers to pick up via `Extension`.
pub async fn attach_request_context(mut req: Request, next: Next) -> Response {
    let context = Arc::new(RequestContext::from_headers(req.headers()));
    req.extensions_mut().insert(context);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID: &str = concat!(
        "keyId=\"https://example.com/actor#main-key\",",
        "signature=\"dGVzdA==\""
    );

    #[test]
    fn actor_memoizes_the_first_value() {
        let ctx = RequestContext::new(None);
        assert!(ctx.actor().is_none());

        ctx.set_actor(json!({"id": "https://example.com/actor"}));
        ctx.set_actor(json!({"id": "https://other.example.com/actor"}));

        let first = ctx.actor().expect("actor was populated").clone();
        let second = ctx.actor().expect("actor stays populated").clone();
        assert_eq!(first, second);
        assert_eq!(first["id"], "https://example.com/actor");
    }

    #[test]
    fn absent_fields_read_as_none_without_computation() {
        let ctx = RequestContext::new(None);
        assert!(ctx.actor().is_none());
        assert!(ctx.instance().is_none());
        assert!(ctx.message().is_none());
        assert!(ctx.signature().is_none());
    }

    #[test]
    fn signature_parse_success_is_memoized() {
        let ctx = RequestContext::new(Some(VALID.to_owned()));

        let first = ctx.signature().expect("header parses");
        assert!(ctx.has_cached_signature());
        let second = ctx.signature().expect("memoized value is returned");
        assert_eq!(first, second);
    }

    #[test]
    fn signature_parse_failure_is_not_cached() {
        let ctx = RequestContext::new(Some("keyId=unquoted".to_owned()));

        assert!(ctx.signature().is_none());
        assert!(!ctx.has_cached_signature());
        // A later access goes through the parser again rather than a
        // cached negative result.
        assert!(ctx.signature().is_none());
        assert!(!ctx.has_cached_signature());
    }

    #[test]
    fn missing_header_is_not_cached_either() {
        let ctx = RequestContext::new(None);
        assert!(ctx.signature().is_none());
        assert!(!ctx.has_cached_signature());
    }
}
