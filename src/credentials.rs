//! Credentials: a password plus optional key-derivation parameters,
//! opaque to everything except the envelope codec.

/// Key-derivation parameters carried alongside a password, used to
/// migrate an archive encrypted under an older iteration count forward
/// without re-prompting the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDerivationParams {
    pub iterations: u32,
}

/// A password plus optional derivation parameters. Never logged: the
/// `Debug` impl redacts the password, and the backing buffer is zeroed
/// on drop.
pub struct Credentials {
    password: String,
    pub key_derivation: Option<KeyDerivationParams>,
}

impl Credentials {
    /// Build credentials from a plaintext password.
    pub fn from_password(password: impl Into<String>) -> Credentials {
        return Credentials { password: password.into(), key_derivation: None };
    }

    /// Build credentials carrying explicit key-derivation parameters.
    pub fn with_key_derivation(password: impl Into<String>, params: KeyDerivationParams) -> Credentials {
        return Credentials { password: password.into(), key_derivation: Some(params) };
    }

    /// The plaintext password.
    pub fn password(&self) -> &str {
        return &self.password;
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Credentials {
        return Credentials {
            password: self.password.clone(),
            key_derivation: self.key_derivation.clone(),
        };
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        // Overwrite the password buffer in place before the String is freed.
        unsafe {
            for byte in self.password.as_bytes_mut() {
                *byte = 0;
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Credentials {{ password: <redacted>, key_derivation: {:?} }}", self.key_derivation);
    }
}
