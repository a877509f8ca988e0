//! Stdio message framing. Clients either send one JSON document per line or
//! LSP-style `Content-Length` framed bodies; replies mirror the request.

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Newline,
    ContentLength,
}

/// One inbound message. `payload` is `Err` when the body was not valid JSON,
/// which the server answers with a parse error instead of shutting down.
#[derive(Debug)]
pub struct Frame {
    pub framing: Framing,
    pub payload: Result<Value, String>,
}

/// Largest `Content-Length` body accepted from a client.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected EOF while reading MCP headers")]
    UnexpectedEof,
    #[error("Invalid Content-Length header: {0}")]
    InvalidContentLength(String),
    #[error("Failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads the next message. Stray lines and header blocks without a
/// `Content-Length` come back as `Err` payloads so the caller can answer and
/// keep reading; only I/O failures and unusable lengths end the stream.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut in_headers = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if in_headers {
                return Err(TransportError::UnexpectedEof);
            }
            return Ok(None);
        }

        let trimmed = line.trim();
        if !in_headers {
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                return Ok(Some(Frame {
                    framing: Framing::Newline,
                    payload: serde_json::from_str(trimmed).map_err(|e| e.to_string()),
                }));
            }
            if header_line(trimmed).is_none() {
                return Ok(Some(Frame {
                    framing: Framing::Newline,
                    payload: Err(format!("expected a JSON message or header, got '{trimmed}'")),
                }));
            }
            in_headers = true;
        }

        if trimmed.is_empty() {
            break;
        }

        let Some((name, raw_len)) = header_line(trimmed) else {
            return Ok(Some(Frame {
                framing: Framing::ContentLength,
                payload: Err(format!("malformed header line '{trimmed}'")),
            }));
        };
        if name.eq_ignore_ascii_case("content-length") {
            let parsed = raw_len
                .parse::<usize>()
                .map_err(|_| TransportError::InvalidContentLength(raw_len.to_string()))?;
            if parsed > MAX_FRAME_BYTES {
                return Err(TransportError::InvalidContentLength(format!(
                    "{parsed} exceeds the {MAX_FRAME_BYTES} byte limit"
                )));
            }
            content_length = Some(parsed);
        }
    }

    let Some(content_length) = content_length else {
        return Ok(Some(Frame {
            framing: Framing::ContentLength,
            payload: Err("missing Content-Length header".to_string()),
        }));
    };
    let mut body = vec![0_u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Some(Frame {
        framing: Framing::ContentLength,
        payload: serde_json::from_slice(&body).map_err(|e| e.to_string()),
    }))
}

/// `Name: value` with a token-like name.
fn header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let is_token = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    is_token.then(|| (name, value.trim()))
}

pub async fn write_frame<W>(
    writer: &mut W,
    value: &Value,
    framing: Framing,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value)?;
    match framing {
        Framing::Newline => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
                body.len()
            );
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reads_newline_delimited_messages_and_skips_blank_lines() {
        let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n[1]\n";
        let mut reader = BufReader::new(&input[..]);

        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.framing, Framing::Newline);
        assert_eq!(first.payload.unwrap()["method"], "ping");

        let second = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(second.payload.unwrap(), json!([1]));

        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_content_length_framed_messages() {
        let body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;
        let input = format!(
            "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n{body}",
            body.len()
        );
        let mut reader = BufReader::new(input.as_bytes());

        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.framing, Framing::ContentLength);
        assert_eq!(frame.payload.unwrap()["id"], 2);
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_json_line_is_reported_not_fatal() {
        let mut reader = BufReader::new(&b"{not json}\n"[..]);
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(frame.payload.is_err());
    }

    #[tokio::test]
    async fn truncated_headers_are_an_error() {
        let mut reader = BufReader::new(&b"Content-Length: 10\r\n"[..]);
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(TransportError::UnexpectedEof)
        ));
    }

    #[tokio::test]
    async fn stray_line_is_reported_and_reading_continues() {
        let input = b"hello\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let mut reader = BufReader::new(&input[..]);

        let stray = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(stray.framing, Framing::Newline);
        assert!(stray.payload.unwrap_err().contains("hello"));

        let next = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(next.payload.unwrap()["id"], 1);
    }

    #[tokio::test]
    async fn header_block_without_length_is_reported_not_fatal() {
        let input = b"X-Other: 1\r\n\r\n{\"id\":2}\n";
        let mut reader = BufReader::new(&input[..]);

        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.framing, Framing::ContentLength);
        assert!(frame.payload.is_err());

        let next = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(next.payload.unwrap()["id"], 2);

        let mut reader = BufReader::new(&b"X-Other: 1\r\nnot a header\r\n"[..]);
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(frame.payload.unwrap_err().contains("not a header"));
    }

    #[tokio::test]
    async fn oversized_content_length_is_refused_without_allocating() {
        let mut reader =
            BufReader::new(&b"Content-Length: 18446744073709551615\r\n\r\n{}"[..]);
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(TransportError::InvalidContentLength(_))
        ));

        let header = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1);
        let mut reader = BufReader::new(header.as_bytes());
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(TransportError::InvalidContentLength(_))
        ));
    }

    #[tokio::test]
    async fn write_frame_round_trips_both_framings() {
        let value = json!({ "jsonrpc": "2.0", "id": 1, "result": {} });
        for framing in [Framing::Newline, Framing::ContentLength] {
            let mut out: Vec<u8> = Vec::new();
            write_frame(&mut out, &value, framing).await.unwrap();
            let mut reader = BufReader::new(out.as_slice());
            let frame = read_frame(&mut reader).await.unwrap().unwrap();
            assert_eq!(frame.framing, framing);
            assert_eq!(frame.payload.unwrap(), value);
        }
    }
}
