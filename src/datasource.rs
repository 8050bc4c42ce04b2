//! The datasource contract: load/save/describe against an encrypted
//! envelope. `TextDatasource` is the canonical in-memory implementation;
//! remote datasources compose a transport with one of these rather than
//! inheriting from it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::envelope::Envelope;
use crate::error::Error;

/// Pure metadata describing a datasource, returned by `describe()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasourceDescriptor {
    /// `"text"` for the in-memory backend; remote kinds register their own.
    pub datasource_type: String,
    pub params: Vec<(String, String)>,
}

/// Abstract storage backend for an archive's encrypted history.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// Load and decrypt the history under `credentials`.
    async fn load(&self, credentials: &Credentials) -> Result<Vec<String>, Error>;

    /// Encrypt and persist `history` under `credentials`, using `config`
    /// for any envelope parameter not overridden by `credentials`'
    /// own `key_derivation` (e.g. the PBKDF2 iteration count).
    async fn save(&self, history: &[String], credentials: &Credentials, config: &Config) -> Result<(), Error>;

    /// Pure, synchronous metadata about this datasource.
    fn describe(&self) -> DatasourceDescriptor;

    /// Whether the "clear before reload" precaution applies: true for
    /// every datasource except the canonical in-memory text backend,
    /// whose content IS the thing being reloaded.
    fn is_text(&self) -> bool {
        return self.describe().datasource_type == "text";
    }

    /// Drop any cached decrypted/raw content so a subsequent `load`
    /// cannot return stale data decrypted under now-invalid credentials,
    /// or stale bytes masquerading as a freshly fetched remote copy.
    /// The in-memory text backend has nothing to cache beyond the
    /// content that `load` reads directly, so the default is a no-op;
    /// remote datasources composing a `TextDatasource` override this to
    /// clear it.
    fn clear_cache(&self) {}
}

/// The canonical in-memory datasource: its content literally IS the
/// envelope text. Remote datasources fetch bytes over a transport, hand
/// them to one of these, then delegate decryption to it.
#[derive(Clone, Default)]
pub struct TextDatasource {
    content: Arc<Mutex<String>>,
}

impl TextDatasource {
    pub fn new() -> TextDatasource {
        return TextDatasource { content: Arc::new(Mutex::new(String::new())) };
    }

    /// Construct a datasource already holding envelope text (e.g. freshly
    /// fetched bytes from a remote transport).
    pub fn from_content(content: impl Into<String>) -> TextDatasource {
        return TextDatasource { content: Arc::new(Mutex::new(content.into())) };
    }

    /// Replace the stored envelope text.
    pub fn set_content(&self, content: impl Into<String>) {
        *self.content.lock().expect("text datasource mutex poisoned") = content.into();
    }

    /// Read the stored envelope text.
    pub fn get_content(&self) -> String {
        return self.content.lock().expect("text datasource mutex poisoned").clone();
    }

    /// Clear the stored content. Used before a remote reload so stale
    /// plaintext can never masquerade as the freshly fetched remote copy.
    pub fn clear_content(&self) {
        self.content.lock().expect("text datasource mutex poisoned").clear();
    }
}

#[async_trait]
impl Datasource for TextDatasource {
    async fn load(&self, credentials: &Credentials) -> Result<Vec<String>, Error> {
        let content = self.get_content();
        if content.is_empty() {
            return Err(Error::NetworkError("text datasource has no content".to_string()));
        }
        let credentials = credentials.clone();
        return tokio::task::spawn_blocking(move || Envelope::decrypt(&content, &credentials))
            .await
            .map_err(|e| Error::InternalInvariant(format!("envelope decrypt task panicked: {}", e)))?;
    }

    async fn save(&self, history: &[String], credentials: &Credentials, config: &Config) -> Result<(), Error> {
        let history = history.to_vec();
        let credentials = credentials.clone();
        let config = config.clone();
        let envelope = tokio::task::spawn_blocking(move || Envelope::encrypt(&history, &credentials, &config))
            .await
            .map_err(|e| Error::InternalInvariant(format!("envelope encrypt task panicked: {}", e)))??;
        self.set_content(envelope);
        return Ok(());
    }

    fn describe(&self) -> DatasourceDescriptor {
        return DatasourceDescriptor { datasource_type: "text".to_string(), params: Vec::new() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let ds = TextDatasource::new();
        let creds = Credentials::from_password("hunter2");
        let history = vec!["cgr 0 g1".to_string(), "tgr g1 Banking".to_string()];
        ds.save(&history, &creds, &Config::default()).await.unwrap();
        let loaded = ds.load(&creds).await.unwrap();
        assert_eq!(loaded, history);
    }

    #[tokio::test]
    async fn load_with_wrong_password_fails() {
        let ds = TextDatasource::new();
        let creds = Credentials::from_password("hunter2");
        let wrong = Credentials::from_password("hunter3");
        ds.save(&["cgr 0 g1".to_string()], &creds, &Config::default()).await.unwrap();
        let result = ds.load(&wrong).await;
        assert!(matches!(result, Err(Error::AuthenticationFailure(_))));
    }

    #[tokio::test]
    async fn save_honors_custom_iteration_count() {
        use base64::Engine as _;
        let ds = TextDatasource::new();
        let creds = Credentials::from_password("hunter2");
        let config = Config::new(0, 500, 500_000);
        ds.save(&["cgr 0 g1".to_string()], &creds, &config).await.unwrap();
        let content = ds.get_content();
        let body = content.splitn(2, '\n').nth(1).unwrap();
        let packed_bytes = base64::engine::general_purpose::STANDARD.decode(body.trim()).unwrap();
        let packed = String::from_utf8(packed_bytes).unwrap();
        let iterations: u32 = packed.split('$').nth(2).unwrap().parse().unwrap();
        assert_eq!(iterations, 500_000);
    }

    #[tokio::test]
    async fn load_with_no_content_is_network_error() {
        let ds = TextDatasource::new();
        let creds = Credentials::from_password("hunter2");
        let result = ds.load(&creds).await;
        assert!(matches!(result, Err(Error::NetworkError(_))));
    }

    #[test]
    fn describe_reports_text_type() {
        let ds = TextDatasource::new();
        assert_eq!(ds.describe().datasource_type, "text");
        assert!(ds.is_text());
    }

    #[test]
    fn clear_content_empties_buffer() {
        let ds = TextDatasource::from_content("something");
        ds.clear_content();
        assert_eq!(ds.get_content(), "");
    }
}
