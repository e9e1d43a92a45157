use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {0} failed: {1}")]
    Request(String, String),
    #[error("{0} returned HTTP {1}")]
    Status(String, u16),
    #[error("decode csv body: {0}")]
    Decode(String),
    #[error("parse csv: {0}")]
    Csv(String),
}

/// Text encoding of the upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    /// UTF-8, tolerating a leading byte-order mark.
    Utf8Sig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub encoding: Encoding,
    pub delimiter: u8,
    /// Skip one free-text title line that precedes the header row.
    pub has_title_row: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            delimiter: b',',
            has_title_row: false,
        }
    }
}

/// Header row plus data rows, cells kept as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Trait abstracting CSV retrieval for testing.
#[async_trait]
pub trait CsvFetcher: Send + Sync {
    async fn fetch_csv(&self, url: &str, opts: &FetchOptions) -> Result<CsvTable, FetchError>;
}

/// Decode `body` and split it into header and data rows.
///
/// An empty body yields an empty table. Rows may be ragged; short rows are
/// left short for the caller to pad.
pub fn parse_csv(body: &[u8], opts: &FetchOptions) -> Result<CsvTable, FetchError> {
    let text = std::str::from_utf8(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let text = match opts.encoding {
        Encoding::Utf8Sig => text.strip_prefix('\u{feff}').unwrap_or(text),
        Encoding::Utf8 => text,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    if opts.has_title_row {
        if let Some(title) = records.next() {
            title.map_err(|e| FetchError::Csv(e.to_string()))?;
        }
    }

    let mut table = CsvTable::default();
    match records.next() {
        Some(header) => {
            let header = header.map_err(|e| FetchError::Csv(e.to_string()))?;
            table.headers = header.iter().map(|h| h.trim().to_string()).collect();
        }
        None => return Ok(table),
    }

    for record in records {
        let record = record.map_err(|e| FetchError::Csv(e.to_string()))?;
        table.rows.push(record.iter().map(String::from).collect());
    }

    Ok(table)
}

/// Real HTTP fetcher backed by reqwest.
pub struct HttpCsvFetcher {
    client: reqwest::Client,
}

impl HttpCsvFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request("client".into(), e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CsvFetcher for HttpCsvFetcher {
    async fn fetch_csv(&self, url: &str, opts: &FetchOptions) -> Result<CsvTable, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(url.into(), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(url.into(), status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Request(url.into(), e.to_string()))?;

        let table = parse_csv(&body, opts)?;
        tracing::info!(url, rows = table.rows.len(), "fetched csv");
        Ok(table)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Serves a fixed CSV body (or a fixed failure) and records each request.
    pub struct MockFetcher {
        body: Result<String, String>,
        pub requests: Mutex<Vec<(String, FetchOptions)>>,
    }

    impl MockFetcher {
        pub fn with_body(body: impl Into<String>) -> Self {
            Self {
                body: Ok(body.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                body: Err(message.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CsvFetcher for MockFetcher {
        async fn fetch_csv(&self, url: &str, opts: &FetchOptions) -> Result<CsvTable, FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), opts.clone()));
            match &self.body {
                Ok(body) => parse_csv(body.as_bytes(), opts),
                Err(msg) => Err(FetchError::Request(url.into(), msg.clone())),
            }
        }
    }
}
