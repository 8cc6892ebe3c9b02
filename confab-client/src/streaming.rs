//! NDJSON decoding for chat-turn response streams.
//!
//! The backend emits one JSON record per line:
//! ```text
//! {"success":true,"chunk":"Hel"}
//! {"success":true,"chunk":"lo"}
//! {"metrics":{"eval_count":3,"eval_duration":120000000}}
//! {"done":true,"full_content":"Hello","metrics":{"eval_count":3},"model":"llama3.2"}
//! ```
//!
//! Lines are classified into [`TurnEvent`]s. A malformed line is discarded
//! and never aborts the stream; the terminal record carries the
//! authoritative full content.

use confab_types::{GenerationMetrics, TurnEvent, TurnStream};
use futures::{Stream, StreamExt};
use reqwest::Response;

/// Wrap an HTTP response body into a cancellable [`TurnStream`].
pub(crate) fn stream_turn(response: Response) -> TurnStream {
    TurnStream::new(decode_ndjson(response.bytes_stream()))
}

/// Decode a raw byte stream into an ordered sequence of [`TurnEvent`]s.
///
/// Buffers bytes across chunk boundaries and splits on line breaks, holding
/// back the trailing incomplete line — a partial line is never parsed. Any
/// bytes left in the buffer when the transport completes cannot form a valid
/// record and are dropped.
fn decode_ndjson(
    byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = TurnEvent> + Send + 'static {
    async_stream::stream! {
        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield TurnEvent::Error(format!("stream read error: {e}"));
                    return;
                }
            };
            buf.extend_from_slice(&chunk);

            while let Some(newline_pos) = buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = buf.drain(..=newline_pos).collect();
                line.pop();

                let line = match std::str::from_utf8(&line) {
                    Ok(s) => s.trim_end_matches('\r'),
                    Err(e) => {
                        tracing::warn!(error = %e, "discarding non-UTF-8 stream line");
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(event) = parse_line(line) {
                    yield event;
                }
            }
        }

        if !buf.is_empty() {
            tracing::debug!(bytes = buf.len(), "discarding incomplete trailing line");
        }
    }
}

/// Classify one complete line as a [`TurnEvent`].
///
/// Returns `None` for malformed or unrecognized records; both are tolerated
/// and skipped. A terminal marker without `full_content` is not treated as
/// terminal — it degrades to whatever else the record carries.
fn parse_line(line: &str) -> Option<TurnEvent> {
    let json: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed stream line");
            return None;
        }
    };

    if json["done"].as_bool().unwrap_or(false) {
        if let Some(content) = json["full_content"].as_str() {
            return Some(TurnEvent::Final {
                content: content.to_string(),
                metrics: parse_metrics(&json),
                model: json["model"].as_str().map(str::to_string),
            });
        }
    }

    if json["success"].as_bool().unwrap_or(false) {
        if let Some(chunk) = json["chunk"].as_str() {
            if !chunk.is_empty() {
                return Some(TurnEvent::Chunk(chunk.to_string()));
            }
            return None;
        }
    }

    if let Some(metrics) = parse_metrics(&json) {
        return Some(TurnEvent::Metrics(metrics));
    }

    tracing::trace!(line, "ignoring unrecognized stream record");
    None
}

fn parse_metrics(json: &serde_json::Value) -> Option<GenerationMetrics> {
    let raw = json.get("metrics")?;
    serde_json::from_value(raw.clone()).ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
