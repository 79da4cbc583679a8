//! Horizon REST + SSE client backed by `reqwest`.
//!
//! Requests are single attempts: the monitor loop owns retry and back-off.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use supplywatch_core::cursor::StreamCursor;
use supplywatch_core::error::FeedError;

use crate::fetcher::{LedgerFeed, LedgerRecord, LedgerStream, TransactionRecord};

/// Configuration for [`HorizonClient`].
#[derive(Debug, Clone)]
pub struct HorizonConfig {
    /// Timeout for each REST request. Streams are not subject to it.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Records per page when listing transactions (Horizon caps at 200).
    pub page_limit: u32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            page_limit: 200,
        }
    }
}

/// Horizon client implementing [`LedgerFeed`].
#[derive(Debug, Clone)]
pub struct HorizonClient {
    base_url: String,
    http: reqwest::Client,
    config: HorizonConfig,
}

impl HorizonClient {
    pub fn new(base_url: impl Into<String>, config: HorizonConfig) -> Result<Self, FeedError> {
        // No overall timeout on the client: it would cut SSE streams.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("supplywatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            config,
        })
    }

    /// Client with default configuration.
    pub fn default_for(base_url: impl Into<String>) -> Result<Self, FeedError> {
        Self::new(base_url, HorizonConfig::default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        missing: Option<u64>,
    ) -> Result<T, FeedError> {
        tracing::trace!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/hal+json")
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(sequence) = missing {
                return Err(FeedError::NotFound { sequence });
            }
        }
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await.map_err(|e| self.map_err(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn map_err(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout {
                ms: self.config.request_timeout.as_millis() as u64,
            }
        } else {
            FeedError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl LedgerFeed for HorizonClient {
    async fn ledger(&self, sequence: u64) -> Result<LedgerRecord, FeedError> {
        let url = format!("{}/ledgers/{sequence}", self.base_url);
        self.get_json(&url, Some(sequence)).await
    }

    async fn latest_ledger(&self) -> Result<LedgerRecord, FeedError> {
        let url = format!("{}/ledgers?order=desc&limit=1", self.base_url);
        let page: Page<LedgerRecord> = self.get_json(&url, None).await?;
        page.embedded
            .records
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::Other("ledger list is empty".into()))
    }

    async fn transactions(&self, sequence: u64) -> Result<Vec<TransactionRecord>, FeedError> {
        let limit = self.config.page_limit;
        let mut url = format!(
            "{}/ledgers/{sequence}/transactions?order=asc&limit={limit}",
            self.base_url
        );
        let mut all = Vec::new();

        loop {
            let page: Page<TransactionRecord> = self.get_json(&url, Some(sequence)).await?;
            let count = page.embedded.records.len();
            let next = page.next_href().map(str::to_string);
            all.extend(page.embedded.records);

            match next {
                Some(next) if count as u32 >= limit && next != url => url = next,
                _ => break,
            }
        }

        tracing::trace!(ledger = sequence, transactions = all.len(), "fetched transactions");
        Ok(all)
    }

    async fn subscribe_ledgers(&self, cursor: StreamCursor) -> Result<LedgerStream, FeedError> {
        let url = format!("{}/ledgers?cursor={}", self.base_url, cursor.as_param());
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| FeedError::StreamClosed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FeedError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        tracing::info!(%cursor, "ledger stream opened");

        let state = StreamState {
            bytes: Box::pin(resp.bytes_stream()),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        };
        let stream = futures::stream::unfold(state, |mut st| async move {
            loop {
                if let Some(item) = st.pending.pop_front() {
                    return Some((item, st));
                }
                if st.done {
                    return None;
                }
                match st.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for frame in st.decoder.push(&chunk) {
                            if let Some(item) = ledger_from_frame(&frame) {
                                st.pending.push_back(item);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        st.pending.push_back(Err(FeedError::StreamClosed(e.to_string())));
                        st.done = true;
                    }
                    None => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

type ByteStream =
    std::pin::Pin<Box<dyn futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>;

struct StreamState {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<LedgerRecord, FeedError>>,
    done: bool,
}

// ─── HAL pages ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
    #[serde(rename = "_links", default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

impl<T> Page<T> {
    fn next_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .map(|l| l.href.as_str())
    }
}

// ─── SSE ──────────────────────────────────────────────────────────────────────

/// One server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` parser. Feed it body chunks, get back
/// every event completed by that chunk.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: String,
    current: SseFrame,
    has_data: bool,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
        let mut frames = Vec::new();

        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if self.has_data {
                    frames.push(std::mem::take(&mut self.current));
                } else {
                    self.current = SseFrame::default();
                }
                self.has_data = false;
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "data" => {
                    if self.has_data {
                        self.current.data.push('\n');
                    }
                    self.current.data.push_str(value);
                    self.has_data = true;
                }
                "event" => self.current.event = Some(value.to_string()),
                "id" => self.current.id = Some(value.to_string()),
                _ => {}
            }
        }
        frames
    }
}

/// Turn one SSE frame into a ledger. Horizon's `"hello"` / `"byebye"`
/// keep-alive frames carry a JSON string rather than an object and are
/// dropped.
fn ledger_from_frame(frame: &SseFrame) -> Option<Result<LedgerRecord, FeedError>> {
    let data = frame.data.trim();
    if !data.starts_with('{') {
        tracing::trace!(data, "skipping non-record SSE frame");
        return None;
    }
    Some(serde_json::from_str(data).map_err(FeedError::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_frames_split_across_chunks() {
        let mut dec = SseDecoder::default();
        assert!(dec.push(b"retry: 1000\nevent: open\ndata: \"hel").is_empty());
        let frames = dec.push(b"lo\"\n\nid: 42\ndata: {\"sequence\":5,");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("open"));
        assert_eq!(frames[0].data, "\"hello\"");

        let frames = dec.push(b"\"paging_token\":\"21474836480\"}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id.as_deref(), Some("42"));

        let ledger = ledger_from_frame(&frames[0]).unwrap().unwrap();
        assert_eq!(ledger.sequence, 5);
        assert_eq!(ledger.paging_token, "21474836480");
    }

    #[test]
    fn sse_comments_and_multiline_data() {
        let mut dec = SseDecoder::default();
        let frames = dec.push(b": keep-alive\n\ndata: a\ndata: b\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn hello_frames_are_dropped() {
        let frame = SseFrame {
            data: "\"hello\"".into(),
            ..Default::default()
        };
        assert!(ledger_from_frame(&frame).is_none());
    }

    #[test]
    fn bad_ledger_json_surfaces_as_error() {
        let frame = SseFrame {
            data: "{\"sequence\":true}".into(),
            ..Default::default()
        };
        assert!(matches!(
            ledger_from_frame(&frame),
            Some(Err(FeedError::Deserialization(_)))
        ));
    }

    #[test]
    fn parses_transaction_page() {
        let body = r#"{
            "_links": {"next": {"href": "https://horizon/ledgers/5/transactions?cursor=2&limit=2&order=asc"}},
            "_embedded": {"records": [
                {"hash": "aa", "ledger": 5, "successful": true, "paging_token": "1", "result_meta_xdr": "AAAABA=="},
                {"hash": "bb", "ledger": 5, "successful": false, "paging_token": "2"}
            ]}
        }"#;
        let page: Page<TransactionRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(page.embedded.records.len(), 2);
        assert_eq!(page.embedded.records[0].result_meta_xdr.as_deref(), Some("AAAABA=="));
        assert!(!page.embedded.records[1].successful);
        assert!(page.next_href().unwrap().contains("cursor=2"));
    }

    #[test]
    fn parses_ledger_record() {
        let body = r#"{
            "id": "abc", "paging_token": "2547814084968448", "hash": "ff",
            "sequence": 593231, "successful_transaction_count": 4,
            "failed_transaction_count": 1, "operation_count": 9,
            "closed_at": "2025-01-02T03:04:05Z"
        }"#;
        let ledger: LedgerRecord = serde_json::from_str(body).unwrap();
        assert_eq!(ledger.sequence, 593_231);
        assert_eq!(ledger.paging_token, "2547814084968448");
        assert!(ledger.closed_at.is_some());
    }

    #[test]
    fn base_url_is_normalised() {
        let client = HorizonClient::default_for("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
