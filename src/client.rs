use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::load_config;
use crate::error::{ApiFaultResponse, format_api_error};
use crate::util::urljoin;

/// DataMall caps every response at this many records. A page of exactly
/// this length means more pages may follow; any shorter page is final.
pub const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base DataMall URL, typically `http://datamall2.mytransport.sg/ltaodataservice`.
    pub url: String,
    /// DataMall account key, as issued on signup.
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,

    progress: bool,

    http: HttpClient,
}

/// Envelope shared by all DataMall OData endpoints: the records live under
/// `value`; the `odata.metadata` sibling is ignored.
#[derive(Debug, serde::Deserialize)]
struct ApiEnvelope {
    value: Vec<Value>,
}

impl Client {
    /// Creates a client using environment variables and/or `.datamallrc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `DATAMALL_URL` / `DATAMALL_API_KEY`
    /// - config file from `DATAMALL_RC` or `.datamallrc`
    pub fn new(url: Option<String>, key: Option<String>) -> Result<Self> {
        let cfg = load_config(url, key)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("datamall-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("datamall-rs")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            progress: true,
            http,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Performs one GET against `<base>/<service>` and returns the record
    /// array found under the response's `value` key, untransformed.
    ///
    /// Any response whose status is not exactly 200 is an error; there is
    /// no retry.
    pub fn fetch_page(&self, service: &str, query: &[(String, String)]) -> Result<Vec<Value>> {
        let url = urljoin(&self.url, service);

        let resp = self
            .apply_auth(self.http.get(&url))
            .query(query)
            .send()
            .context("could not connect")?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if status != StatusCode::OK {
            // Auth and quota failures arrive as gateway fault payloads;
            // parse them for actionable messages.
            if let Ok(fault) = serde_json::from_str::<ApiFaultResponse>(&text) {
                return Err(format_api_error(status, &url, &fault));
            }

            bail!(
                "API request failed: HTTP {} for url ({})\n{}",
                status,
                url,
                text
            );
        }

        let envelope: ApiEnvelope = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse API JSON (url={}, status={})", url, status))?;
        Ok(envelope.value)
    }

    /// Fetches every page of `service` and returns the records of all pages
    /// as one ordered sequence.
    ///
    /// The first call carries the given query parameters; follow-up calls
    /// carry only `$skip`, set to the number of records accumulated so far.
    /// The loop stops at the first page shorter than [`PAGE_SIZE`]. A result
    /// set whose length is an exact multiple of the page size costs one
    /// extra call, which returns an empty page.
    pub fn fetch_all(&self, service: &str, query: &[(String, String)]) -> Result<Vec<Value>> {
        let page = self.fetch_page(service, query)?;

        // Common case: a single short page is the whole result set.
        if page.len() < PAGE_SIZE {
            return Ok(page);
        }

        let pb = if self.progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}").unwrap());
            Some(pb)
        } else {
            None
        };

        let mut records = page;
        let mut last_len = records.len();
        while last_len == PAGE_SIZE {
            if let Some(pb) = &pb {
                pb.set_message(format!("{} record(s) fetched", records.len()));
                pb.tick();
            }

            let skip = [("$skip".to_string(), records.len().to_string())];
            let page = self.fetch_page(service, &skip)?;
            last_len = page.len();
            records.extend(page);
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        Ok(records)
    }

    fn apply_auth(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        req.header("AccountKey", self.key.trim())
            .header(ACCEPT, "application/json")
    }
}
