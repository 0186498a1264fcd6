//! Request signing for the Binance REST API
//!
//! Signed endpoints take an HMAC-SHA256 signature computed over the full
//! query string, keyed with the account's secret key.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a query string with the account secret, hex encoded
pub fn sign_query(query: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Current wall-clock time in milliseconds, as the exchange expects it
pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
