// Request authentication for the CDP API.
// - Bearer token: short-lived HS256 JWT issued by the API key
// - X-Wallet-Auth: HS256 JWT bound to the exact request (method, uri, body hash)
// - Webhook subscription signature: hex HMAC over timestamp + method + path + body

use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of bearer tokens, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct ApiKeyClaims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletAuthClaims {
    iat: i64,
    nbf: i64,
    jti: String,
    uris: Vec<String>,
    req_hash: String,
}

pub fn bearer_token(api_key_id: &str, api_key_secret: &str, now: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = ApiKeyClaims {
        iss: api_key_id,
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(api_key_secret.as_bytes()),
    )
}

/// `uri` is `"<METHOD> <host><path>"`, e.g. `"POST api.cdp.coinbase.com/platform/v2/evm/accounts"`.
pub fn wallet_auth_token(
    wallet_secret: &str,
    uri: &str,
    body: &[u8],
    now: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = WalletAuthClaims {
        iat: now,
        nbf: now,
        jti: uuid::Uuid::new_v4().simple().to_string(),
        uris: vec![uri.to_string()],
        req_hash: hex::encode(Sha256::digest(body)),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(wallet_secret.as_bytes()),
    )
}

pub fn subscription_signature(api_key_secret: &str, timestamp: i64, method: &str, path: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(api_key_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
