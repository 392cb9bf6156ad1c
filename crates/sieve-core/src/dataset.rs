//! Request logs in NDJSON form, one request per line:
//!
//! ```text
//! {"domainId":1,"pageId":7,"frameUrl":"https://site.com/","url":"https://ads.net/a.js","cpt":"script"}
//! ```
//!
//! Used to drive regression tests and benchmarks.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::types::Request;

/// Error type for request log reading.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogRecord {
    #[serde(default)]
    pub domain_id: u64,
    #[serde(default)]
    pub page_id: u64,
    /// URL of the frame that issued the request
    pub frame_url: String,
    pub url: String,
    /// Content policy type, e.g. `script` or `image`
    pub cpt: String,
}

impl RequestLogRecord {
    pub fn to_request(&self) -> Request {
        Request::from_urls(&self.url, &self.frame_url, &self.cpt)
    }
}

/// Read every record of an NDJSON log. Blank lines are skipped; any
/// malformed line fails the read with its 1-based line number.
pub fn read_request_log(reader: impl BufRead) -> Result<Vec<RequestLogRecord>, DatasetError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|source| DatasetError::Json {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    log::debug!("read {} request log records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestType;

    const LOG: &str = r#"{"domainId":1,"pageId":2,"frameUrl":"https://news.example.com/","url":"https://ads.tracker.net/pixel.gif","cpt":"image"}

{"frameUrl":"https://news.example.com/","url":"https://cdn.example.com/app.js","cpt":"script"}
"#;

    #[test]
    fn test_read_request_log() {
        let records = read_request_log(LOG.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain_id, 1);
        assert_eq!(records[0].page_id, 2);
        assert_eq!(records[1].domain_id, 0);
        assert_eq!(records[1].cpt, "script");
    }

    #[test]
    fn test_to_request() {
        let records = read_request_log(LOG.as_bytes()).unwrap();

        let third = records[0].to_request();
        assert_eq!(third.hostname, "ads.tracker.net");
        assert_eq!(third.source_hostname, "news.example.com");
        assert_eq!(third.request_type, RequestType::IMAGE);
        assert!(third.is_third_party);

        let first = records[1].to_request();
        assert!(!first.is_third_party);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let log = "{\"frameUrl\":\"\",\"url\":\"\",\"cpt\":\"\"}\nnot json\n";
        match read_request_log(log.as_bytes()) {
            Err(DatasetError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
