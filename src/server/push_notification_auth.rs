//! JWS-signed push notification delivery (A2A push-notification-auth).
//!
//! The sender owns one RSA keypair per process, publishes it as a JWKS at
//! `/.well-known/jwks.json`, and signs every outbound delivery with RS256 so
//! a receiver can verify the notification actually came from this agent and
//! was not tampered with in transit.
//!
//! Nothing in the teacher crate does JWS signing, so this module is new
//! construction grounded on two things already present in the retrieved
//! pack: the DashMap-backed JWKS cache shape from
//! `trysoma-soma/crates/identity/src/logic/jwks_cache.rs` (mirrored here by
//! [`JwksCache`]), and `jsonwebtoken` + `rsa`/`sha2` for the actual RS256
//! math, the same crates `AdaWorldAPI-crewai-rust` reaches for to do its own
//! request signing (AWS SigV4).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{A2AError, A2AResult};

/// RSA modulus size for the generated signing key.
const RSA_KEY_BITS: usize = 2048;

/// Claims accepted for a replayed/stale push notification (§4.2, §8 invariant 5).
const CLOCK_SKEW_SECS: i64 = 5 * 60;

/// Timeout for the receiver-URL ownership challenge (§4.2).
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameter name used for the receiver-URL ownership challenge.
const VALIDATION_TOKEN_PARAM: &str = "validationToken";

/// One RSA public key in JWK form (RFC 7517), as served inside a [`JwkSet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type — always `"RSA"` for this signer.
    pub kty: String,
    /// Base64url-encoded modulus.
    pub n: String,
    /// Base64url-encoded public exponent.
    pub e: String,
    /// Algorithm this key is used with.
    pub alg: String,
    /// Intended use — `"sig"`.
    #[serde(rename = "use")]
    pub usage: String,
    /// Key id — `sha256(DER-encoded public key)`, hex-encoded.
    pub kid: String,
}

/// A JSON Web Key Set, served verbatim at `/.well-known/jwks.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    /// The published keys.
    pub keys: Vec<Jwk>,
}

/// Claims carried by every signed push-notification delivery (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PushNotificationClaims {
    /// Issued-at, Unix seconds.
    iat: i64,
    /// Hex-encoded `sha256(body_bytes)`.
    request_body_sha256: String,
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Sender-side push-notification signer.
///
/// Generates one RSA keypair at construction time, signs outbound delivery
/// bodies with RS256, and exposes the corresponding [`JwkSet`] for receivers
/// to verify against.
pub struct PushNotificationAuth {
    encoding_key: EncodingKey,
    jwk: Jwk,
    http: reqwest::Client,
}

impl std::fmt::Debug for PushNotificationAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotificationAuth")
            .field("kid", &self.jwk.kid)
            .finish_non_exhaustive()
    }
}

impl PushNotificationAuth {
    /// Generate a fresh RSA-2048 keypair and build the signer.
    pub fn generate() -> A2AResult<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| A2AError::InternalError {
                message: format!("failed to generate RSA keypair: {e}"),
                data: None,
            })?;
        Self::from_private_key(private_key)
    }

    /// Build the signer from an existing private key (used by tests that
    /// need deterministic keys, or deployments that persist the key across
    /// restarts).
    pub fn from_private_key(private_key: RsaPrivateKey) -> A2AResult<Self> {
        let public_key = private_key.to_public_key();

        let der = public_key
            .to_public_key_der()
            .map_err(|e| A2AError::InternalError {
                message: format!("failed to DER-encode public key: {e}"),
                data: None,
            })?;
        let kid = sha256_hex(der.as_bytes());

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let jwk = Jwk {
            kty: "RSA".to_string(),
            n,
            e,
            alg: "RS256".to_string(),
            usage: "sig".to_string(),
            kid: kid.clone(),
        };

        let pem = private_key
            .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| A2AError::InternalError {
                message: format!("failed to PEM-encode private key: {e}"),
                data: None,
            })?;
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| A2AError::InternalError {
                message: format!("failed to load signing key: {e}"),
                data: None,
            })?;

        Ok(Self {
            encoding_key,
            jwk,
            http: reqwest::Client::new(),
        })
    }

    /// The key id this signer publishes and signs with.
    pub fn kid(&self) -> &str {
        &self.jwk.kid
    }

    /// The JWKS document served at `/.well-known/jwks.json`.
    pub fn jwks(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk.clone()],
        }
    }

    /// Sign a request body and return the bearer token to send in the
    /// `Authorization` header of the outbound POST (§4.2 "signed delivery").
    pub fn sign(&self, body: &[u8]) -> A2AResult<String> {
        let claims = PushNotificationClaims {
            iat: now_unix(),
            request_body_sha256: sha256_hex(body),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.jwk.kid.clone());

        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            A2AError::InternalError {
                message: format!("failed to sign push notification: {e}"),
                data: None,
            }
        })
    }

    /// Verify ownership of a receiver URL before a push config is accepted
    /// for a task (§4.2, §4.4 `tasks/pushNotification/set`).
    ///
    /// Issues `GET <url>?validationToken=<nonce>` and requires the response
    /// body to contain the nonce within [`VALIDATION_TIMEOUT`]. Any failure —
    /// network error, non-2xx status, missing echo, or timeout — is surfaced
    /// as `invalid params` so the caller rejects the config.
    pub async fn verify_receiver_url(&self, url: &str) -> A2AResult<()> {
        let token = uuid::Uuid::new_v4().to_string();

        let response = tokio::time::timeout(
            VALIDATION_TIMEOUT,
            self.http
                .get(url)
                .query(&[(VALIDATION_TOKEN_PARAM, token.as_str())])
                .send(),
        )
        .await
        .map_err(|_| A2AError::InvalidParams {
            message: format!("receiver URL '{url}' did not respond within {VALIDATION_TIMEOUT:?}"),
            data: None,
        })?
        .map_err(|e| A2AError::InvalidParams {
            message: format!("receiver URL '{url}' is unreachable: {e}"),
            data: None,
        })?;

        if !response.status().is_success() {
            return Err(A2AError::InvalidParams {
                message: format!(
                    "receiver URL '{url}' returned status {} during ownership verification",
                    response.status()
                ),
                data: None,
            });
        }

        let body = response.text().await.map_err(|e| A2AError::InvalidParams {
            message: format!("receiver URL '{url}' returned an unreadable body: {e}"),
            data: None,
        })?;

        if !body.contains(&token) {
            return Err(A2AError::InvalidParams {
                message: format!("receiver URL '{url}' did not echo the validation token"),
                data: None,
            });
        }

        debug!(url = %url, "receiver URL ownership verified");
        Ok(())
    }
}

/// Receiver-side verifier: fetches and caches a sender's JWKS by `kid`,
/// validates signature, freshness, and body-hash equality on each delivery.
///
/// Not required for this crate's own server role (which only sends), but
/// provided so a client embedding this crate can verify pushes it receives,
/// and so the sign/verify round trip is testable in one process.
pub struct PushNotificationVerifier {
    http: reqwest::Client,
    jwks_cache: Arc<RwLock<HashMap<String, Jwk>>>,
}

impl Default for PushNotificationVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PushNotificationVerifier {
    /// Create a verifier with an empty JWKS cache.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Verify a delivered push notification.
    ///
    /// `jwks_url` is the issuer's `/.well-known/jwks.json` endpoint;
    /// `authorization_header` is the raw `Authorization` header value
    /// (`Bearer <jwt>`); `body` is the exact bytes of the POSTed body.
    pub async fn verify(
        &self,
        jwks_url: &str,
        authorization_header: &str,
        body: &[u8],
    ) -> A2AResult<()> {
        let token = authorization_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| A2AError::InvalidParams {
                message: "missing Bearer prefix on push notification Authorization header"
                    .to_string(),
                data: None,
            })?;

        let header = jsonwebtoken::decode_header(token).map_err(|e| A2AError::InvalidParams {
            message: format!("malformed push notification JWT: {e}"),
            data: None,
        })?;
        let kid = header.kid.ok_or_else(|| A2AError::InvalidParams {
            message: "push notification JWT has no kid".to_string(),
            data: None,
        })?;

        let jwk = self.resolve_key(jwks_url, &kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            A2AError::InvalidParams {
                message: format!("invalid JWK for kid '{kid}': {e}"),
                data: None,
            }
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = decode::<PushNotificationClaims>(token, &decoding_key, &validation)
            .map_err(|e| A2AError::InvalidParams {
                message: format!("push notification signature invalid: {e}"),
                data: None,
            })?;

        let age = (now_unix() - decoded.claims.iat).abs();
        if age > CLOCK_SKEW_SECS {
            return Err(A2AError::InvalidParams {
                message: format!("push notification is stale ({age}s old)"),
                data: None,
            });
        }

        let expected_hash = sha256_hex(body);
        if decoded.claims.request_body_sha256 != expected_hash {
            return Err(A2AError::InvalidParams {
                message: "push notification body hash mismatch".to_string(),
                data: None,
            });
        }

        Ok(())
    }

    async fn resolve_key(&self, jwks_url: &str, kid: &str) -> A2AResult<Jwk> {
        if let Some(jwk) = self.jwks_cache.read().await.get(kid).cloned() {
            return Ok(jwk);
        }

        let jwk_set: JwkSet = self
            .http
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| A2AError::InvalidParams {
                message: format!("failed to fetch JWKS from '{jwks_url}': {e}"),
                data: None,
            })?
            .json()
            .await
            .map_err(|e| A2AError::InvalidParams {
                message: format!("invalid JWKS document from '{jwks_url}': {e}"),
                data: None,
            })?;

        let mut cache = self.jwks_cache.write().await;
        for jwk in jwk_set.keys {
            cache.insert(jwk.kid.clone(), jwk);
        }

        cache.get(kid).cloned().ok_or_else(|| A2AError::InvalidParams {
            message: format!("kid '{kid}' not present in JWKS from '{jwks_url}'"),
            data: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kid_is_sha256_of_public_key_der() {
        let auth = PushNotificationAuth::generate().unwrap();
        assert_eq!(auth.kid().len(), 64, "sha256 hex digest is 64 chars");
    }

    #[test]
    fn jwks_contains_one_rsa_signing_key() {
        let auth = PushNotificationAuth::generate().unwrap();
        let jwks = auth.jwks();
        assert_eq!(jwks.keys.len(), 1);
        assert_eq!(jwks.keys[0].kty, "RSA");
        assert_eq!(jwks.keys[0].alg, "RS256");
        assert_eq!(jwks.keys[0].kid, auth.kid());
    }

    #[test]
    fn sign_produces_header_with_matching_kid() {
        let auth = PushNotificationAuth::generate().unwrap();
        let body = br#"{"id":"t1"}"#;
        let jwt = auth.sign(body).unwrap();

        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.kid.as_deref(), Some(auth.kid()));
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[tokio::test]
    async fn verifier_accepts_signature_produced_by_signer() {
        let auth = PushNotificationAuth::generate().unwrap();
        let body = br#"{"id":"t1","status":{"state":"completed"}}"#;
        let jwt = auth.sign(body).unwrap();

        // Pre-seed the verifier's cache directly, mirroring what a fetch of
        // `/.well-known/jwks.json` would populate — avoids spinning up an
        // HTTP server just to exercise the crypto path.
        let verifier = PushNotificationVerifier::new();
        {
            let mut cache = verifier.jwks_cache.write().await;
            for jwk in auth.jwks().keys {
                cache.insert(jwk.kid.clone(), jwk);
            }
        }

        let header = format!("Bearer {jwt}");
        verifier
            .verify("http://unused.invalid/jwks.json", &header, body)
            .await
            .expect("signature should verify against the signer's own key");
    }

    #[tokio::test]
    async fn verifier_rejects_tampered_body() {
        let auth = PushNotificationAuth::generate().unwrap();
        let body = br#"{"id":"t1"}"#;
        let jwt = auth.sign(body).unwrap();

        let verifier = PushNotificationVerifier::new();
        {
            let mut cache = verifier.jwks_cache.write().await;
            for jwk in auth.jwks().keys {
                cache.insert(jwk.kid.clone(), jwk);
            }
        }

        let header = format!("Bearer {jwt}");
        let tampered = br#"{"id":"t2"}"#;
        let result = verifier
            .verify("http://unused.invalid/jwks.json", &header, tampered)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verifier_rejects_missing_bearer_prefix() {
        let verifier = PushNotificationVerifier::new();
        let result = verifier
            .verify("http://unused.invalid/jwks.json", "Basic abc123", b"{}")
            .await;
        assert!(result.is_err());
    }
}
