// Device HTTP client
//
// Wraps `reqwest::Client` with device-specific URL construction, status
// checking and body decoding. One instance talks to exactly one device.

use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{Control, StatusResponse};
use crate::transport::TransportConfig;

/// Raw HTTP client for the device's `/api` surface.
///
/// Holds no device state: every call is an independent request. Status
/// reads return the decoded body, control writes return `()` on any 2xx.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the device root (e.g. `http://192.168.4.1`); the
    /// `/api/` prefix is added per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Resolve a configured device address into a base URL.
    ///
    /// Accepts a bare host or `host:port` (assumed plain HTTP) as well as a
    /// full `http://` / `https://` URL.
    pub fn base_url_for_host(host: &str) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        if host.contains("://") {
            Ok(Url::parse(host)?)
        } else {
            Ok(Url::parse(&format!("http://{host}"))?)
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/status`
    ///
    /// Any non-2xx status or a body that is not a complete status document
    /// is an error; there is no partial result.
    pub async fn get_status(&self) -> Result<StatusResponse, Error> {
        let url = self.api_url("status")?;
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                path: url.path().to_owned(),
            });
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "status body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// `POST /api/{led|buzzer|servo|hanger|pump}`
    ///
    /// The firmware expects the JSON document as a `text/plain` body.
    pub async fn post_control(&self, control: Control) -> Result<(), Error> {
        let url = self.api_url(control.path())?;
        let body = serde_json::to_string(&control.body())?;
        debug!(body = %body, "POST {}", url);

        let resp = self
            .http
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Status {
                status: status.as_u16(),
                path: url.path().to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        let url = DeviceClient::base_url_for_host("192.168.4.1").expect("valid host");
        assert_eq!(url.as_str(), "http://192.168.4.1/");
    }

    #[test]
    fn full_url_is_kept() {
        let url = DeviceClient::base_url_for_host("http://esp32.local:8080/").expect("valid url");
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.host_str(), Some("esp32.local"));
    }

    #[test]
    fn api_url_appends_prefix_once() {
        let base = DeviceClient::base_url_for_host("10.0.0.7").expect("valid host");
        let client = DeviceClient::with_client(reqwest::Client::new(), base);
        let url = client.api_url("led").expect("valid url");
        assert_eq!(url.as_str(), "http://10.0.0.7/api/led");
    }
}
