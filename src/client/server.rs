//! License server access.
//!
//! [`LicenseServer`] is a synchronous request/response exchange: the
//! activation client sends a license key and gets the raw response body
//! back. Timeouts are the implementation's responsibility and surface as
//! errors.

use crate::errors::LicenseResult;

pub trait LicenseServer {
    /// Request an activation for `key`, returning the raw response body.
    fn contact_server(&self, key: &str) -> LicenseResult<String>;
}

impl<T: LicenseServer + ?Sized> LicenseServer for &T {
    fn contact_server(&self, key: &str) -> LicenseResult<String> {
        (**self).contact_server(key)
    }
}

/// A server that is never reachable (offline installations).
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineServer;

impl LicenseServer for OfflineServer {
    fn contact_server(&self, _key: &str) -> LicenseResult<String> {
        Err(crate::errors::LicenseError::NetworkError(
            "offline mode: license server is not contacted".to_string(),
        ))
    }
}

#[cfg(feature = "http")]
pub use http::HttpLicenseServer;

#[cfg(feature = "http")]
mod http {
    use std::thread;
    use std::time::Duration;

    use reqwest::Client;
    use serde::Serialize;
    use tokio::runtime::{Builder, Handle, Runtime};
    use uuid::Uuid;

    use super::LicenseServer;
    use crate::config::ServerConfig;
    use crate::errors::{LicenseError, LicenseResult};

    /// Header carrying a per-request correlation id.
    pub const REQUEST_ID_HEADER: &str = "x-request-id";

    /// Request payload for the activation endpoint.
    #[derive(Debug, Serialize)]
    struct ActivationRequest<'a> {
        license_key: &'a str,
    }

    /// HTTP client for the activation endpoint.
    ///
    /// Owns a current-thread tokio runtime and blocks on it for each request,
    /// so callers stay synchronous. Called from inside another tokio runtime,
    /// the request is driven on a separate thread instead, and dropping the
    /// server there shuts the owned runtime down in the background.
    pub struct HttpLicenseServer {
        client: Client,
        runtime: Option<Runtime>,
        endpoint: String,
    }

    impl HttpLicenseServer {
        /// `POST {base_url}{activate_path}` with the given timeout.
        pub fn new(base_url: &str, activate_path: &str, timeout: Duration) -> LicenseResult<Self> {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LicenseError::NetworkError(format!("failed to start runtime: {e}")))?;

            let client = Client::builder()
                .connect_timeout(timeout)
                .timeout(timeout)
                .build()?;

            Ok(Self {
                client,
                runtime: Some(runtime),
                endpoint: format!("{}{}", base_url.trim_end_matches('/'), activate_path),
            })
        }

        pub fn from_config(config: &ServerConfig) -> LicenseResult<Self> {
            Self::new(
                &config.url,
                &config.activate_path,
                Duration::from_secs(config.timeout_secs),
            )
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }

        async fn request(&self, key: &str) -> LicenseResult<String> {
            let request_id = Uuid::new_v4().to_string();
            log::debug!("POST {} (request id {})", self.endpoint, request_id);

            let resp = self
                .client
                .post(&self.endpoint)
                .header(REQUEST_ID_HEADER, &request_id)
                .json(&ActivationRequest { license_key: key })
                .send()
                .await?; // → LicenseError::NetworkError

            if !resp.status().is_success() {
                return Err(LicenseError::ServerError(format!(
                    "Activation failed with HTTP status {}",
                    resp.status()
                )));
            }

            Ok(resp.text().await?)
        }
    }

    impl std::fmt::Debug for HttpLicenseServer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HttpLicenseServer")
                .field("endpoint", &self.endpoint)
                .finish_non_exhaustive()
        }
    }

    impl Drop for HttpLicenseServer {
        fn drop(&mut self) {
            if let Some(runtime) = self.runtime.take() {
                runtime.shutdown_background();
            }
        }
    }

    impl LicenseServer for HttpLicenseServer {
        fn contact_server(&self, key: &str) -> LicenseResult<String> {
            let runtime = self
                .runtime
                .as_ref()
                .ok_or_else(|| LicenseError::NetworkError("runtime is shut down".to_string()))?;

            // block_on panics on a thread that is already driving a runtime
            if Handle::try_current().is_err() {
                return runtime.block_on(self.request(key));
            }

            log::debug!("inside an async runtime, sending activation request from a helper thread");
            thread::scope(|scope| {
                scope
                    .spawn(|| runtime.block_on(self.request(key)))
                    .join()
                    .unwrap_or_else(|_| {
                        Err(LicenseError::NetworkError(
                            "activation request thread panicked".to_string(),
                        ))
                    })
            })
        }
    }

}
