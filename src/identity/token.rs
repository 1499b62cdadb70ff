//! JWT-shaped session tokens.
//!
//! `base64(header) . base64(payload) . signature` where the signature is a fixed
//! placeholder. Nothing here is cryptographically verified: a token is *well-formed* when
//! it has three non-empty segments and its payload decodes to JSON, and *active*
//! when it is well-formed and not past its `exp`.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::user::User;

pub const PLACEHOLDER_SIGNATURE: &str = "mock_jwt_signature_for_development";

/// Standard alphabet, padding optional on decode.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Decoded token payload. User fields are denormalised copies taken at issue time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub tin: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

// Backend-issued tokens carry `sub` as a string and timestamps as floats.
fn value_as_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

impl TokenClaims {
    /// Read claims from any JSON payload. Fields are taken from an object when present;
    /// other JSON values yield empty claims with no expiry.
    pub fn from_json(payload: &serde_json::Value) -> Self {
        let Some(obj) = payload.as_object() else { return Self::default(); };
        let text = |k: &str| obj.get(k).and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let int = |k: &str| obj.get(k).and_then(value_as_i64);
        Self {
            sub: int("sub").unwrap_or(0),
            name: text("name"),
            email: text("email"),
            business_name: text("business_name"),
            phone: text("phone"),
            tin: text("tin"),
            iat: int("iat").unwrap_or(0),
            exp: int("exp"),
        }
    }

    pub fn is_active_at(&self, now: i64) -> bool {
        match self.exp { None => true, Some(exp) => exp > now }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("expected 3 segments, found {0}")]
    SegmentCount(usize),
    #[error("segment {0} is empty")]
    EmptySegment(usize),
    #[error("payload is not base64")]
    Base64,
    #[error("payload is not valid json: {0}")]
    Json(String),
}

fn now_secs() -> i64 { chrono::Utc::now().timestamp() }

/// Issue a token for `subject_id` valid for `ttl_secs` from now. A non-positive ttl yields a
/// token that is already inactive.
pub fn issue(subject_id: i64, user: &User, ttl_secs: i64) -> String {
    issue_at(subject_id, user, ttl_secs, now_secs())
}

pub fn issue_at(subject_id: i64, user: &User, ttl_secs: i64, now: i64) -> String {
    let header = TokenHeader { alg: "HS256".into(), typ: "JWT".into() };
    let claims = TokenClaims {
        sub: subject_id,
        name: user.name.clone(),
        email: user.email.clone(),
        business_name: user.business_name.clone(),
        phone: user.phone.clone(),
        tin: user.tin.clone(),
        iat: now,
        exp: Some(now.saturating_add(ttl_secs)),
    };
    // serialising plain structs of strings and integers cannot fail
    let h = serde_json::to_vec(&header).unwrap_or_default();
    let p = serde_json::to_vec(&claims).unwrap_or_default();
    let engine = base64::engine::general_purpose::STANDARD;
    format!("{}.{}.{}", engine.encode(h), engine.encode(p), PLACEHOLDER_SIGNATURE)
}

/// Structural parse with the reason for rejection.
pub fn parse(token: &str) -> Result<TokenClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 { return Err(TokenError::SegmentCount(parts.len())); }
    if let Some(i) = parts.iter().position(|p| p.is_empty()) { return Err(TokenError::EmptySegment(i)); }
    let bytes = LENIENT_STANDARD.decode(parts[1])
        .or_else(|_| LENIENT_URL_SAFE.decode(parts[1]))
        .map_err(|_| TokenError::Base64)?;
    let payload: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))?;
    Ok(TokenClaims::from_json(&payload))
}

/// Payload of a well-formed token, `None` otherwise.
pub fn decode(token: &str) -> Option<TokenClaims> {
    match parse(token) {
        Ok(c) => Some(c),
        Err(e) => {
            debug!(target: "token", error = %e, "rejecting malformed token");
            None
        }
    }
}

pub fn is_active(token: &str) -> bool { is_active_at(token, now_secs()) }

pub fn is_active_at(token: &str, now: i64) -> bool {
    match decode(token) {
        Some(c) => {
            let active = c.is_active_at(now);
            if !active { debug!(target: "token", exp = c.exp, now = now, "token expired"); }
            active
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod token_tests;
