//! HTTP client for the Comtrade data and reference endpoints.

use crate::{
    catalog::{Catalog, CatalogKind},
    error::{excerpt, ComtradeError, Result},
    fetcher::TradeSource,
    query::ChunkRequest,
    record::{parse_data_response, TradeRecord},
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://comtradeplus.un.org";
pub const DEFAULT_REFERENCE_URL: &str = "https://comtradeapi.un.org/files/v1/app/reference";

/// Goods, as opposed to services (`S`)
pub const DEFAULT_TYPE_CODE: &str = "C";
/// Harmonized System commodity classification
pub const DEFAULT_CLASSIFICATION: &str = "HS";

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ComtradeClient {
    client: Client,
    subscription_key: String,
    base_url: String,
    reference_url: String,
    type_code: String,
    classification: String,
}

impl ComtradeClient {
    pub fn new(subscription_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(ComtradeClient {
            client,
            subscription_key: subscription_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            reference_url: DEFAULT_REFERENCE_URL.to_string(),
            type_code: DEFAULT_TYPE_CODE.to_string(),
            classification: DEFAULT_CLASSIFICATION.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reference_url(mut self, reference_url: impl Into<String>) -> Self {
        self.reference_url = reference_url.into().trim_end_matches('/').to_string();
        self
    }

    fn data_url(&self, request: &ChunkRequest<'_>) -> String {
        format!(
            "{}/data/v1/get/{}/{}/{}",
            self.base_url,
            self.type_code,
            request.spec.frequency.code(),
            self.classification
        )
    }

    /// Download the reporter or partner reference list.
    pub async fn fetch_catalog(&self, kind: CatalogKind) -> Result<Catalog> {
        let url = format!("{}/{}", self.reference_url, kind.file_name());
        info!("Fetching catalog: {}", kind);
        let response = self.client.get(&url).send().await?;
        // Reference files are static downloads whose content type varies;
        // only the status and the body shape are checked.
        let body = checked_body(response, "Comtrade reference API").await?;
        let catalog = Catalog::parse(&body)?;
        info!("Catalog {} fetched: {} entries", kind, catalog.len());
        Ok(catalog)
    }
}

#[async_trait]
impl TradeSource for ComtradeClient {
    async fn fetch_chunk(&self, request: &ChunkRequest<'_>) -> Result<Vec<TradeRecord>> {
        let url = self.data_url(request);
        let pairs = request.query_pairs();
        debug!("Requesting {} with {:?}", url, pairs);
        let response = self
            .client
            .get(&url)
            .query(&pairs)
            .header("Accept", "application/json")
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .send()
            .await?;
        let body = checked_json_body(response, "Comtrade API").await?;
        parse_data_response(&body)
    }
}

/// Reject non-success statuses, keeping the start of the body for context.
async fn checked_body(response: Response, service: &'static str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ComtradeError::Status {
            service,
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }
    Ok(response.text().await?)
}

/// Like [`checked_body`], and also reject non-JSON content types.
async fn checked_json_body(response: Response, service: &'static str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return checked_body(response, service).await;
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.text().await?;
    if !content_type.contains("application/json") {
        return Err(ComtradeError::ContentType {
            content_type,
            body: excerpt(&body),
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BODY_EXCERPT_LEN;
    use crate::period::PeriodSelection;
    use crate::query::{FlowDirection, QuerySpec};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &str, content_type: &str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        url
    }

    fn spec() -> QuerySpec {
        QuerySpec::new(
            "36",
            "156",
            "030631",
            FlowDirection::Export,
            &PeriodSelection::Annual {
                start: 2021,
                end: 2022,
            },
        )
        .unwrap()
    }

    async fn fetch_from(url: String) -> Result<Vec<TradeRecord>> {
        let client = ComtradeClient::new("key").unwrap().with_base_url(url);
        let spec = spec();
        let chunks = spec.chunks(12).unwrap();
        client.fetch_chunk(&chunks[0]).await
    }

    #[tokio::test]
    async fn test_html_reply_is_a_content_type_error() {
        let url = serve_once("200 OK", "text/html", "<html>maintenance</html>".to_string()).await;
        match fetch_from(url).await {
            Err(ComtradeError::ContentType { content_type, body }) => {
                assert_eq!(content_type, "text/html");
                assert_eq!(body, "<html>maintenance</html>");
            }
            other => panic!("expected a content type error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_keeps_body_excerpt() {
        let url = serve_once("429 Too Many Requests", "text/plain", "x".repeat(500)).await;
        match fetch_from(url).await {
            Err(ComtradeError::Status { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body.len(), BODY_EXCERPT_LEN);
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_json_reply_decodes() {
        let body = r#"{"data": [{"period": "2021", "primaryValue": 50, "netWgt": 5}]}"#;
        let url = serve_once("200 OK", "application/json; charset=utf-8", body.to_string()).await;
        let records = fetch_from(url).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unit_price(), Some(10.0));
    }

    #[tokio::test]
    async fn test_catalog_accepts_any_content_type() {
        let body = r#"{"results": [{"id": 36, "text": "Australia"}]}"#;
        let url = serve_once("200 OK", "application/octet-stream", body.to_string()).await;
        let client = ComtradeClient::new("key").unwrap().with_reference_url(url);
        let catalog = client.fetch_catalog(CatalogKind::Reporters).await.unwrap();
        assert_eq!(catalog.name_of("36"), Some("Australia"));
    }

    #[tokio::test]
    async fn test_catalog_error_status() {
        let url = serve_once("404 Not Found", "text/plain", "missing".to_string()).await;
        let client = ComtradeClient::new("key").unwrap().with_reference_url(url);
        assert!(matches!(
            client.fetch_catalog(CatalogKind::Partners).await,
            Err(ComtradeError::Status { status: 404, .. })
        ));
    }
}
