//! Facade builder.
//!
//! Wires one configured [`HttpTransport`] into every feature session so they
//! share a connection pool, headers and interceptors.

use std::sync::Arc;
use std::time::Duration;

use cognisuite_core::execution::http::{HttpInterceptor, LoggingInterceptor};
use cognisuite_core::features::{
    ChatAssistant, CodeAnalyzer, DataGenerator, DocInspector, VectorStudio, VoiceAssistant,
};
use cognisuite_core::types::HttpConfig;
use cognisuite_core::{ClientConfig, CogniError, HttpTransport, Transport};

/// Entry point holding the shared transport.
#[derive(Clone)]
pub struct CogniSuite {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl CogniSuite {
    pub fn builder() -> CogniSuiteBuilder {
        CogniSuiteBuilder::new()
    }

    /// Build from `COGNISUITE_BASE_URL` and defaults.
    pub fn from_env() -> Result<Self, CogniError> {
        CogniSuiteBuilder::from_env().build()
    }

    /// Use a custom transport, e.g. a test double.
    pub fn with_transport(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn code_analyzer(&self) -> CodeAnalyzer {
        CodeAnalyzer::new(self.transport())
    }

    pub fn doc_inspector(&self) -> DocInspector {
        DocInspector::new(self.transport())
    }

    pub fn data_generator(&self) -> DataGenerator {
        DataGenerator::new(self.transport())
    }

    pub fn vector_studio(&self) -> VectorStudio {
        VectorStudio::new(self.transport())
    }

    pub fn chat_assistant(&self) -> ChatAssistant {
        ChatAssistant::new(self.transport())
    }

    pub fn voice_assistant(&self) -> VoiceAssistant {
        VoiceAssistant::new(self.transport())
    }
}

#[derive(Default)]
pub struct CogniSuiteBuilder {
    config: ClientConfig,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    http_client: Option<reqwest::Client>,
    http_debug: bool,
}

impl CogniSuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `COGNISUITE_BASE_URL` / `COGNISUITE_STREAM_DISABLE_COMPRESSION`.
    pub fn from_env() -> Self {
        Self {
            config: ClientConfig::from_env(),
            ..Self::default()
        }
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        let http = self.config.http;
        self.config = ClientConfig::new(base_url).with_http_config(http);
        self
    }

    pub fn http_config(mut self, http: HttpConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Whole-request timeout. Also bounds how long a stream may stay open.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = Some(timeout);
        self
    }

    pub fn proxy<S: Into<String>>(mut self, proxy_url: S) -> Self {
        self.config.http.proxy = Some(proxy_url.into());
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.http.user_agent = Some(user_agent.into());
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.config.http.headers.insert(key.into(), value.into());
        self
    }

    pub fn stream_disable_compression(mut self, disable: bool) -> Self {
        self.config.http.stream_disable_compression = disable;
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Install the built-in [`LoggingInterceptor`].
    pub fn http_debug(mut self, enabled: bool) -> Self {
        self.http_debug = enabled;
        self
    }

    /// Custom HTTP client; takes precedence over timeout, proxy and header settings.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<CogniSuite, CogniError> {
        if self.config.base_url.is_empty() {
            return Err(CogniError::ConfigurationError(
                "base_url must not be empty".to_string(),
            ));
        }
        if !self.config.base_url.starts_with("http://")
            && !self.config.base_url.starts_with("https://")
        {
            return Err(CogniError::ConfigurationError(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.config.base_url
            )));
        }

        let base_url = self.config.base_url.clone();
        let mut transport = match self.http_client {
            Some(client) => HttpTransport::with_client(self.config, client),
            None => HttpTransport::new(self.config)?,
        };
        if self.http_debug {
            transport = transport.with_interceptor(Arc::new(LoggingInterceptor));
        }
        for interceptor in self.interceptors {
            transport = transport.with_interceptor(interceptor);
        }

        tracing::debug!(target: "cognisuite::client", base_url=%base_url, "client built");
        Ok(CogniSuite {
            transport: Arc::new(transport),
            base_url,
        })
    }
}
