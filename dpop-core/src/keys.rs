//! EC P-256 key material: load/generate, JWK projection, thumbprint (RFC 7638).
//!
//! This module is intentionally storage- and transport-agnostic: it knows how to
//! turn a P-256 key pair into the handful of representations the rest of the
//! protocol needs (signing key, public JWK, thumbprint, PEM) and nothing else.

use std::path::Path;

use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey};
use jsonwebtoken::jwk::{Jwk, ThumbprintHash};
use p256::SecretKey;
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

use crate::error::KeyError;

/// An EC P-256 key pair, held for the lifetime of the owning process.
///
/// `encoding_key` is derived once at construction time (PKCS8 DER, the shape
/// `jsonwebtoken` expects) so that signing never needs to re-derive it per call.
pub struct KeyPair {
    secret_key: SecretKey,
    encoding_key: EncodingKey,
    public_jwk: Jwk,
}

impl KeyPair {
    fn from_secret_key(secret_key: SecretKey) -> Result<Self, KeyError> {
        let pkcs8_der = secret_key
            .to_pkcs8_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let encoding_key = EncodingKey::from_ec_der(pkcs8_der.as_bytes());
        let public_jwk = Jwk::from_encoding_key(&encoding_key, Algorithm::ES256)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;

        Ok(Self {
            secret_key,
            encoding_key,
            public_jwk,
        })
    }

    /// Generate a fresh P-256 key pair, independent of any file on disk.
    pub fn generate() -> Result<Self, KeyError> {
        let secret_key = SecretKey::random(&mut rand_core::OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Load a SEC1 "EC PRIVATE KEY" PEM from `path` if it exists and is valid;
    /// otherwise generate a fresh key and persist it to `path` with mode 0600.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();

        if path.exists() {
            let pem = std::fs::read_to_string(path)?;
            let secret_key = SecretKey::from_sec1_pem(&pem)
                .map_err(|e| KeyError::Format(e.to_string()))?;
            return Self::from_secret_key(secret_key);
        }

        let keypair = Self::generate()?;
        keypair.persist(path)?;
        Ok(keypair)
    }

    /// Write the private key to `path` as a SEC1 PEM with permission mode 0600.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), KeyError> {
        let pem = self
            .secret_key
            .to_sec1_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        std::fs::write(path.as_ref(), pem.as_bytes())?;
        set_owner_only_permissions(path.as_ref())?;
        Ok(())
    }

    /// The signing key, in the shape `jsonwebtoken` uses to sign ES256 JWTs.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The public JWK for this key pair: `{"kty":"EC","crv":"P-256","x":...,"y":...}`.
    ///
    /// `x` and `y` are always the full 32-byte coordinate encodings (the
    /// underlying extraction splits a fixed-width uncompressed SEC1 point, so
    /// there is no leading-zero truncation to guard against here).
    pub fn public_jwk(&self) -> Jwk {
        self.public_jwk.clone()
    }

    /// A stable local identifier for this key: `base64url(x || y)[..16]`.
    ///
    /// This is NOT the RFC 7638 thumbprint — it's a short tag for logs and
    /// JWK `kid` fields, not a protocol-relevant value.
    pub fn kid(&self) -> Result<String, KeyError> {
        let (x, y) = ec_coordinates(&self.public_jwk)?;
        let mut combined = x;
        combined.extend_from_slice(&y);
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(combined);
        Ok(encoded.chars().take(16).collect())
    }

    /// The RFC 7638 JWK thumbprint of the public key (43-char base64url, SHA-256).
    pub fn thumbprint(&self) -> String {
        self.public_jwk.thumbprint(ThumbprintHash::SHA256)
    }

    /// Export the public key as a PKIX SubjectPublicKeyInfo PEM.
    ///
    /// This is a plain library function, not a standalone CLI tool: callers
    /// that need to hand the public key to an operator or another process
    /// invoke it directly rather than shelling out to a dedicated binary.
    pub fn export_public_pem(&self) -> Result<String, KeyError> {
        self.secret_key
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Export(e.to_string()))
    }
}

fn ec_coordinates(jwk: &Jwk) -> Result<(Vec<u8>, Vec<u8>), KeyError> {
    use jsonwebtoken::jwk::AlgorithmParameters;

    match &jwk.algorithm {
        AlgorithmParameters::EllipticCurve(params) => {
            let x = base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(&params.x)
                .map_err(|e| KeyError::Format(e.to_string()))?;
            let y = base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(&params.y)
                .map_err(|e| KeyError::Format(e.to_string()))?;
            Ok((x, y))
        }
        _ => Err(KeyError::Format("expected an EC JWK".to_string())),
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), KeyError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), KeyError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The canonical form `{"crv":"P-256","kty":"EC","x":...,"y":...}` for this
    // key hashes (SHA-256, base64url-nopad) to the value below; verified
    // independently outside of `jsonwebtoken` itself. Note this is NOT the
    // thumbprint often quoted alongside this JWK elsewhere, which is RFC
    // 7638 Appendix A.1's *RSA* example vector, not an EC one -- the two
    // don't belong together, and is a good reminder to verify vectors
    // against your own library rather than copying them.
    #[test]
    fn thumbprint_reference_vector() {
        let jwk: Jwk = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
        }))
        .unwrap();

        assert_eq!(
            jwk.thumbprint(ThumbprintHash::SHA256),
            "oKIywvGUpTVTyxMQ3bwIIeQUudfr_CkLMjCE19ECD-U"
        );
    }

    #[test]
    fn thumbprint_is_43_char_base64url() {
        let key = KeyPair::generate().unwrap();
        let thumbprint = key.thumbprint();
        assert_eq!(thumbprint.len(), 43);
        assert!(!thumbprint.contains('='));
    }

    #[test]
    fn same_public_key_same_thumbprint() {
        let key = KeyPair::generate().unwrap();
        let reloaded = KeyPair::from_secret_key(key.secret_key.clone()).unwrap();
        assert_eq!(key.thumbprint(), reloaded.thumbprint());
    }

    #[test]
    fn different_keys_different_thumbprints() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        assert_ne!(a.thumbprint(), b.thumbprint());
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let dir = std::env::temp_dir().join(format!("dpop-core-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("private_key.pem");

        let original = KeyPair::load_or_generate(&path).unwrap();
        let reloaded = KeyPair::load_or_generate(&path).unwrap();

        assert_eq!(original.thumbprint(), reloaded.thumbprint());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn kid_is_16_chars_and_stable() {
        let key = KeyPair::generate().unwrap();
        let kid = key.kid().unwrap();
        assert_eq!(kid.len(), 16);
        assert_eq!(kid, key.kid().unwrap());
    }

    #[test]
    fn export_public_pem_round_trips() {
        let key = KeyPair::generate().unwrap();
        let pem = key.export_public_pem().unwrap();
        assert!(pem.contains("BEGIN PUBLIC KEY"));
    }
}
