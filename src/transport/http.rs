//! Smart and dumb HTTP(S) ref discovery

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::advertisement::{parse_dumb, parse_smart_http, Advertisement};
use crate::error::{Error, Result};
use crate::refs::Ref;

use super::{Close, FetchConnection, Transport};

const SERVICE: &str = "git-upload-pack";

pub struct HttpTransport {
    url: Url,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(url: Url) -> Self {
        Self { url, timeout: None }
    }

    /// `<repo>/info/refs?service=git-upload-pack`
    fn info_refs_url(&self) -> Url {
        let mut url = self.url.clone();
        let path = format!("{}/info/refs", self.url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(Some(&format!("service={}", SERVICE)));
        url.set_fragment(None);
        url
    }

    fn client(&self) -> Result<Client> {
        let mut builder = Client::builder().user_agent(format!(
            "git/2.0 ({}/{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = self.timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

impl Transport for HttpTransport {
    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn open_fetch(&mut self) -> Result<Box<dyn FetchConnection>> {
        let url = self.info_refs_url();
        tracing::debug!("Requesting {}", url);

        let response = self.client()?.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connection(format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes()?;

        let advertisement = parse_response(&content_type, &body)?;
        Ok(Box::new(HttpConnection { advertisement }))
    }
}

impl Close for HttpTransport {
    fn close(&mut self) {
        tracing::debug!("Closing HTTP transport for {}", self.url);
    }
}

/// Smart servers label their advertisement; anything else is a dumb `info/refs`
fn parse_response(content_type: &str, body: &[u8]) -> Result<Advertisement> {
    let smart_type = format!("application/x-{}-advertisement", SERVICE);
    // Parameters such as `charset` don't change the media type
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if media_type.eq_ignore_ascii_case(&smart_type) {
        parse_smart_http(body, SERVICE)
    } else {
        tracing::debug!("Falling back to dumb HTTP (content type '{}')", content_type);
        let text = std::str::from_utf8(body)
            .map_err(|_| Error::Protocol("info/refs is not valid UTF-8".to_string()))?;
        parse_dumb(text)
    }
}

/// HTTP is stateless, so the advertisement is all there is to hold on to
struct HttpConnection {
    advertisement: Advertisement,
}

impl FetchConnection for HttpConnection {
    fn refs(&mut self) -> Result<Vec<Ref>> {
        Ok(self.advertisement.refs.clone())
    }

    fn capabilities(&self) -> &[String] {
        &self.advertisement.capabilities
    }
}

impl Close for HttpConnection {
    fn close(&mut self) {}
}
