use std::time::Duration;

use log::{debug, error};
use reqwest::blocking::Client;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::settings::Settings;

/// Raw status and body of a single GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The one network operation the scraper needs.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> Result<HttpResponse>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        // reqwest's blocking client defaults to a 30s timeout; `None` disables it.
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse> {
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Fetches target pages through the scraping proxy API.
pub struct Fetcher<T: Transport> {
    transport: T,
    endpoint: String,
    api_key: Option<String>,
    dynamic: bool,
}

impl Fetcher<HttpTransport> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::new(settings.timeout_secs.map(Duration::from_secs))?;
        Ok(Fetcher::new(
            transport,
            settings.api_endpoint.clone(),
            settings.api_key.clone(),
            settings.dynamic,
        ))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, endpoint: String, api_key: Option<String>, dynamic: bool) -> Self {
        Fetcher {
            transport,
            endpoint,
            api_key,
            dynamic,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Provider URL for `target`. The target is query-encoded, never interpolated raw.
    pub fn request_url(&self, target: &str) -> Result<Url> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ScrapeError::Configuration("API key missing".into()))?;
        let dynamic = if self.dynamic { "true" } else { "false" };
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("api_key", api_key), ("url", target), ("dynamic", dynamic)],
        )?;
        Ok(url)
    }

    /// GETs `target` through the provider; anything but a 200 is a `Fetch` error.
    pub fn fetch(&self, target: &str) -> Result<Vec<u8>> {
        let url = self.request_url(target)?;
        debug!("Fetching {}", target);

        let resp = self.transport.get(&url)?;
        if resp.status == 200 {
            return Ok(resp.body);
        }

        let body = String::from_utf8_lossy(&resp.body).into_owned();
        error!("Fetch of {} failed with status {}", target, resp.status);
        Err(ScrapeError::Fetch {
            status: resp.status,
            body,
        })
    }
}
