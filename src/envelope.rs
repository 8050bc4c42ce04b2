//! The encrypted envelope format: a human-readable signature line
//! followed by a base64-packed, password-encrypted history.
//!
//! ```text
//! b~>buttercup/a v1.0
//! <BASE64(salt$iv$iterations$ciphertext$hmac)>
//! ```
//!
//! Key derivation is PBKDF2-HMAC-SHA256 over the password and a random
//! salt, producing 64 bytes of key material: the first 32 bytes are the
//! AES-256-CBC encryption key, the last 32 are the HMAC-SHA256
//! authentication key. The body is authenticated HMAC-then-encrypt
//! style is avoided in favor of encrypt-then-MAC: the HMAC covers the IV
//! and ciphertext, never the plaintext.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "b~>buttercup/a v";
const FORMAT_MAJOR: u32 = 1;
const FORMAT_MINOR: u32 = 0;
const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;
const KEY_MATERIAL_LEN: usize = 64;

/// Encrypts and decrypts a history against a password, producing or
/// consuming the on-disk envelope text.
pub struct Envelope;

impl Envelope {
    /// Encrypt `history` under `credentials`, producing the full
    /// signed, base64-packed envelope text.
    pub fn encrypt(history: &[String], credentials: &Credentials, config: &Config) -> Result<String, Error> {
        let plaintext = history.join("\n");
        let iterations = credentials
            .key_derivation
            .as_ref()
            .map(|p| p.iterations)
            .unwrap_or(config.pbkdf2_iterations)
            .max(Config::MIN_PBKDF2_ITERATIONS);

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let key_material = Self::derive_key_material(credentials.password(), &salt, iterations);
        let (enc_key, mac_key) = key_material.split_at(32);

        let cipher = Aes256CbcEnc::new_from_slices(enc_key, &iv).expect("32-byte key, 16-byte iv");
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut mac = HmacSha256::new_from_slice(mac_key).expect("hmac accepts any key length");
        mac.update(&iv);
        mac.update(&ciphertext);
        let tag = mac.finalize().into_bytes();

        let packed = format!(
            "{}${}${}${}${}",
            hex::encode(salt),
            hex::encode(iv),
            iterations,
            hex::encode(&ciphertext),
            hex::encode(tag),
        );

        let signature = format!("{}{}.{}", SIGNATURE_PREFIX, FORMAT_MAJOR, FORMAT_MINOR);
        return Ok(format!("{}\n{}", signature, BASE64.encode(packed)));
    }

    /// Decrypt an envelope produced by [`Envelope::encrypt`], returning
    /// the original history lines.
    pub fn decrypt(envelope: &str, credentials: &Credentials) -> Result<Vec<String>, Error> {
        let mut lines = envelope.splitn(2, '\n');
        let signature = lines
            .next()
            .ok_or_else(|| Error::UnrecognizedFormat("empty envelope".to_string()))?;
        let body = lines
            .next()
            .ok_or_else(|| Error::UnrecognizedFormat("missing envelope body".to_string()))?;

        let (major, _minor) = Self::parse_signature(signature)?;
        if major != FORMAT_MAJOR {
            return Err(Error::UnrecognizedFormat(format!(
                "unsupported major version {} (expected {})",
                major, FORMAT_MAJOR
            )));
        }

        let packed = BASE64
            .decode(body.trim())
            .map_err(|e| Error::UnrecognizedFormat(format!("bad base64 body: {}", e)))?;
        let packed = String::from_utf8(packed)
            .map_err(|e| Error::UnrecognizedFormat(format!("non-utf8 packed body: {}", e)))?;

        let fields: Vec<&str> = packed.split('$').collect();
        if fields.len() != 5 {
            return Err(Error::AuthenticationFailure("truncated encrypted packet".to_string()));
        }
        let salt = hex::decode(fields[0]).map_err(|_| Error::AuthenticationFailure("bad salt encoding".into()))?;
        let iv = hex::decode(fields[1]).map_err(|_| Error::AuthenticationFailure("bad iv encoding".into()))?;
        let iterations: u32 = fields[2]
            .parse()
            .map_err(|_| Error::AuthenticationFailure("bad iteration count".into()))?;
        let ciphertext =
            hex::decode(fields[3]).map_err(|_| Error::AuthenticationFailure("bad ciphertext encoding".into()))?;
        let tag = hex::decode(fields[4]).map_err(|_| Error::AuthenticationFailure("bad hmac encoding".into()))?;

        let key_material = Self::derive_key_material(credentials.password(), &salt, iterations);
        let (enc_key, mac_key) = key_material.split_at(32);

        let mut mac = HmacSha256::new_from_slice(mac_key).expect("hmac accepts any key length");
        mac.update(&iv);
        mac.update(&ciphertext);
        mac.verify_slice(&tag).map_err(|_| Error::AuthenticationFailure("hmac mismatch".to_string()))?;

        let cipher = Aes256CbcDec::new_from_slices(enc_key, &iv).expect("32-byte key, 16-byte iv");
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| Error::AuthenticationFailure("bad padding".to_string()))?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| Error::AuthenticationFailure("decrypted body is not utf8".to_string()))?;

        if plaintext.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(plaintext.split('\n').map(|s| s.to_string()).collect());
    }

    fn derive_key_material(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_MATERIAL_LEN] {
        let mut out = [0u8; KEY_MATERIAL_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
        return out;
    }

    fn parse_signature(line: &str) -> Result<(u32, u32), Error> {
        let version = line
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or_else(|| Error::UnrecognizedFormat(format!("missing signature: {:?}", line)))?;
        let mut parts = version.splitn(2, '.');
        let major = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::UnrecognizedFormat(format!("bad version: {:?}", version)))?;
        let minor = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::UnrecognizedFormat(format!("bad version: {:?}", version)))?;
        return Ok((major, minor));
    }
}
