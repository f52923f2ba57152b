/*!
 * Option Token (C4)
 *
 * Signs a generated option into a compact, self-contained, URL-safe token
 * so the server does not need to remember it between `GET /availability/options`
 * and `POST /public/appointments` (§4.4). The shape mirrors a signed,
 * salted, TTL-bounded cookie: `base64url(payload) . base64url(hmac)`.
 *
 * Verification never trusts the clock embedded in the token alone — it is
 * checked against the server's own clock at verify time, the same way a
 * salted signing scheme rejects a token whose signature doesn't match
 * before ever looking at its age.
 */

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::options::{BookingOption, OptionBlock};

type HmacSha256 = Hmac<Sha256>;

const SALT: &[u8] = b"booking.option.v1";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("option token is malformed")]
    Malformed,
    #[error("option token signature does not match")]
    BadSignature,
    #[error("option token has expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenBlock {
    sequence: i16,
    worker_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    service_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenPayload {
    option_id: Uuid,
    appointment_start: DateTime<Utc>,
    appointment_end: DateTime<Utc>,
    blocks: Vec<TokenBlock>,
    issued_at: i64,
}

impl From<&BookingOption> for TokenPayload {
    fn from(opt: &BookingOption) -> Self {
        TokenPayload {
            option_id: opt.option_id,
            appointment_start: opt.appointment_start,
            appointment_end: opt.appointment_end,
            blocks: opt
                .blocks
                .iter()
                .map(|b| TokenBlock {
                    sequence: b.sequence,
                    worker_id: b.worker_id,
                    start: b.start,
                    end: b.end,
                    service_ids: b.service_ids.clone(),
                })
                .collect(),
            issued_at: 0, // overwritten by `encode` with the real issue time
        }
    }
}

/// The decoded, verified contents of an option token — enough for the
/// reservation service to rebuild `AppointmentBlock`/`AppointmentServiceLine`
/// rows without re-deriving the option (§4.4, §5).
#[derive(Debug, Clone)]
pub struct DecodedOption {
    pub option_id: Uuid,
    pub appointment_start: DateTime<Utc>,
    pub appointment_end: DateTime<Utc>,
    pub blocks: Vec<OptionBlock>,
}

fn sign(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(SALT);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Signs `option` into a token with `issued_at` as the issue time (seconds
/// since the Unix epoch, supplied by the caller so this function stays a
/// pure, clock-free transform — see the crate-wide ban on reading the
/// system clock from domain code).
pub fn encode(option: &BookingOption, secret: &[u8], issued_at: i64) -> String {
    let mut payload: TokenPayload = option.into();
    payload.issued_at = issued_at;

    let payload_json = serde_json::to_vec(&payload).expect("TokenPayload always serializes");
    let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);
    let signature = sign(secret, payload_b64.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

    format!("{payload_b64}.{signature_b64}")
}

/// Verifies `token`'s signature and age, returning the decoded option on
/// success. `now` and `ttl_seconds` are both supplied by the caller for the
/// same clock-free reason as `encode`'s `issued_at`.
pub fn decode(token: &str, secret: &[u8], now: i64, ttl_seconds: i64) -> Result<DecodedOption, TokenError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;
    let expected = sign(secret, payload_b64.as_bytes());
    if signature.len() != expected.len() || !constant_time_eq(&signature, &expected) {
        return Err(TokenError::BadSignature);
    }

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let payload: TokenPayload = serde_json::from_slice(&payload_json).map_err(|_| TokenError::Malformed)?;

    let age = now - payload.issued_at;
    if age < 0 || age > ttl_seconds {
        return Err(TokenError::Expired);
    }

    Ok(DecodedOption {
        option_id: payload.option_id,
        appointment_start: payload.appointment_start,
        appointment_end: payload.appointment_end,
        blocks: payload
            .blocks
            .into_iter()
            .map(|b| OptionBlock {
                sequence: b.sequence,
                worker_id: b.worker_id,
                start: b.start,
                end: b.end,
                service_ids: b.service_ids,
            })
            .collect(),
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[allow(dead_code)]
fn epoch_to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::OptionBlock;
    use chrono::TimeZone;

    fn sample_option() -> BookingOption {
        BookingOption {
            option_id: Uuid::new_v4(),
            appointment_start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            appointment_end: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            gap_total_minutes: 0,
            blocks: vec![OptionBlock {
                sequence: 1,
                worker_id: Uuid::new_v4(),
                start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
                service_ids: vec![Uuid::new_v4()],
            }],
        }
    }

    #[test]
    fn round_trips_a_valid_token() {
        let option = sample_option();
        let secret = b"test-secret";
        let token = encode(&option, secret, 1_700_000_000);
        let decoded = decode(&token, secret, 1_700_000_100, 300).unwrap();
        assert_eq!(decoded.option_id, option.option_id);
        assert_eq!(decoded.appointment_start, option.appointment_start);
        assert_eq!(decoded.blocks.len(), 1);
    }

    #[test]
    fn rejects_a_token_past_its_ttl() {
        let option = sample_option();
        let secret = b"test-secret";
        let token = encode(&option, secret, 1_700_000_000);
        let err = decode(&token, secret, 1_700_000_400, 300).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let option = sample_option();
        let token = encode(&option, b"secret-a", 1_700_000_000);
        let err = decode(&token, b"secret-b", 1_700_000_100, 300).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let option = sample_option();
        let secret = b"test-secret";
        let token = encode(&option, secret, 1_700_000_000);
        let (payload, sig) = token.split_once('.').unwrap();
        let tampered = format!("{}x.{}", payload, sig);
        let err = decode(&tampered, secret, 1_700_000_100, 300).unwrap_err();
        assert_eq!(err, TokenError::BadSignature);
    }

    #[test]
    fn rejects_a_malformed_token() {
        let err = decode("not-a-token", b"secret", 1_700_000_000, 300).unwrap_err();
        assert_eq!(err, TokenError::Malformed);
    }

    #[test]
    fn rejects_a_future_issued_at() {
        let option = sample_option();
        let secret = b"test-secret";
        let token = encode(&option, secret, 1_700_000_500);
        let err = decode(&token, secret, 1_700_000_000, 300).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }
}
