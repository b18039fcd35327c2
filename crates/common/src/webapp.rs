//! Telegram WebApp `initData` verification.
//!
//! When the mini-app opens, Telegram hands it a signed query string
//! (`initData`) identifying the user. The signature scheme is
//! HMAC-SHA256 over a canonicalized form of the fields:
//!
//! 1. drop the `hash` field, sort the rest lexicographically by key,
//!    join as `key=value` lines with `\n`;
//! 2. `secret_key = HMAC_SHA256(key = bot_token, msg = "WebAppData")`;
//! 3. `hash = hex(HMAC_SHA256(key = secret_key, msg = check_string))`.
//!
//! The operand order in step 2 matters: the bot token is the HMAC *key*,
//! `"WebAppData"` the message. Payloads older than [`MAX_AGE_SECS`] are
//! rejected even when the signature checks out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age of an `initData` payload.
pub const MAX_AGE_SECS: i64 = 86_400;

/// The `user` field of a verified `initData` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebAppUser {
    /// Telegram user ID.
    pub id: i64,
    /// First name as set in the Telegram profile.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name, if set.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Username, if set.
    #[serde(default)]
    pub username: Option<String>,
    /// IETF language tag of the client.
    #[serde(default)]
    pub language_code: Option<String>,
}

/// A verified, decoded `initData` payload.
#[derive(Debug, Clone)]
pub struct InitData {
    /// The user who opened the mini-app, when Telegram supplied one.
    pub user: Option<WebAppUser>,
    /// When Telegram signed the payload.
    pub auth_date: DateTime<Utc>,
    /// All fields except `hash`, percent-decoded.
    pub fields: BTreeMap<String, String>,
}

impl InitData {
    /// The verified Telegram user, or `Unauthorized` when the payload
    /// carried no `user` field.
    pub fn require_user(&self) -> AppResult<&WebAppUser> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Verify an `initData` string against the bot token.
///
/// Returns the decoded fields on success. Any malformation, a missing or
/// mismatched `hash`, or a stale `auth_date` yields `Unauthorized` —
/// callers must not proceed on failure.
pub fn verify_init_data(raw: &str, bot_token: &str) -> AppResult<InitData> {
    verify_init_data_at(raw, bot_token, Utc::now())
}

fn verify_init_data_at(raw: &str, bot_token: &str, now: DateTime<Utc>) -> AppResult<InitData> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        let value = urlencoding::decode(value).map_err(|_| AppError::Unauthorized)?;
        fields.insert(key.to_string(), value.into_owned());
    }

    let received_hash = fields.remove("hash").ok_or(AppError::Unauthorized)?;
    let received_hash = hex::decode(received_hash).map_err(|_| AppError::Unauthorized)?;

    // BTreeMap iterates in key order, which is exactly the canonical order.
    let check_string = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret_key = sign(bot_token.as_bytes(), b"WebAppData");
    let mut mac = HmacSha256::new_from_slice(&secret_key)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(check_string.as_bytes());
    // Constant-time comparison.
    mac.verify_slice(&received_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let auth_date = fields
        .get("auth_date")
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(AppError::Unauthorized)?;

    if now.signed_duration_since(auth_date).num_seconds() > MAX_AGE_SECS {
        return Err(AppError::Unauthorized);
    }

    let user = match fields.get("user") {
        Some(json) => {
            Some(serde_json::from_str::<WebAppUser>(json).map_err(|_| AppError::Unauthorized)?)
        }
        None => None,
    };

    Ok(InitData {
        user,
        auth_date,
        fields,
    })
}

#[allow(clippy::expect_used)]
fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const BOT_TOKEN: &str = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";

    /// Build a signed initData string the way Telegram does.
    fn signed_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted: Vec<(&str, &str)> = pairs.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let check_string = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let secret = sign(bot_token.as_bytes(), b"WebAppData");
        let hash = hex::encode(sign(&secret, check_string.as_bytes()));

        let mut encoded: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        encoded.push(format!("hash={hash}"));
        encoded.join("&")
    }

    fn sample_pairs(auth_date: DateTime<Utc>) -> Vec<(String, String)> {
        vec![
            ("query_id".to_string(), "AAHdF6IQAAAAAN0XohDhrOrc".to_string()),
            (
                "user".to_string(),
                r#"{"id":279058397,"first_name":"Vlad","username":"vlad"}"#.to_string(),
            ),
            ("auth_date".to_string(), auth_date.timestamp().to_string()),
        ]
    }

    #[test]
    fn valid_payload_verifies() {
        let now = Utc::now();
        let pairs = sample_pairs(now);
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let raw = signed_init_data(&borrowed, BOT_TOKEN);

        let data = verify_init_data_at(&raw, BOT_TOKEN, now).unwrap();
        let user = data.require_user().unwrap();
        assert_eq!(user.id, 279_058_397);
        assert_eq!(user.username.as_deref(), Some("vlad"));
    }

    #[test]
    fn tampered_payload_fails() {
        let now = Utc::now();
        let pairs = sample_pairs(now);
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let raw = signed_init_data(&borrowed, BOT_TOKEN);

        // Flip one character of the signed user id.
        let tampered = raw.replace("279058397", "279058398");
        assert!(verify_init_data_at(&tampered, BOT_TOKEN, now).is_err());
    }

    #[test]
    fn tampered_hash_fails() {
        let now = Utc::now();
        let pairs = sample_pairs(now);
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let raw = signed_init_data(&borrowed, BOT_TOKEN);

        let (head, hash) = raw.rsplit_once("hash=").unwrap();
        let flipped = if hash.as_bytes()[0] == b'0' { "1" } else { "0" };
        let tampered = format!("{head}hash={flipped}{}", &hash[1..]);
        assert!(verify_init_data_at(&tampered, BOT_TOKEN, now).is_err());
    }

    #[test]
    fn missing_hash_fails() {
        assert!(verify_init_data_at("auth_date=1700000000&query_id=x", BOT_TOKEN, Utc::now()).is_err());
    }

    #[test]
    fn wrong_token_fails() {
        let now = Utc::now();
        let pairs = sample_pairs(now);
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let raw = signed_init_data(&borrowed, BOT_TOKEN);
        assert!(verify_init_data_at(&raw, "999999:other-token", now).is_err());
    }

    #[test]
    fn swapped_hmac_operands_fail() {
        // A signature derived with secret = HMAC(key="WebAppData", msg=token)
        // (the swapped order seen in the wild) must not verify.
        let now = Utc::now();
        let pairs = sample_pairs(now);
        let mut sorted: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        sorted.sort_by_key(|(k, _)| *k);
        let check_string = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let swapped_secret = sign(b"WebAppData", BOT_TOKEN.as_bytes());
        let hash = hex::encode(sign(&swapped_secret, check_string.as_bytes()));

        let mut encoded: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        encoded.push(format!("hash={hash}"));
        let raw = encoded.join("&");

        assert!(verify_init_data_at(&raw, BOT_TOKEN, now).is_err());
    }

    #[test]
    fn stale_auth_date_fails() {
        let signed_at = Utc::now() - TimeDelta::seconds(MAX_AGE_SECS + 10);
        let pairs = sample_pairs(signed_at);
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let raw = signed_init_data(&borrowed, BOT_TOKEN);
        assert!(verify_init_data_at(&raw, BOT_TOKEN, Utc::now()).is_err());
    }

    #[test]
    fn payload_without_user_verifies_but_require_user_fails() {
        let now = Utc::now();
        let auth_date = now.timestamp().to_string();
        let pairs = vec![("auth_date", auth_date.as_str()), ("query_id", "abc")];
        let raw = signed_init_data(&pairs, BOT_TOKEN);

        let data = verify_init_data_at(&raw, BOT_TOKEN, now).unwrap();
        assert!(data.user.is_none());
        assert!(data.require_user().is_err());
    }
}
