use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use futures_core::stream::Stream;
use spark_socket_core::context::CallContext;
use spark_socket_core::error::{Result, SocketError};

use crate::connection::Connection;

/// A lazy stream of the raw chunks `conn` hands back, one socket read at a
/// time. Nothing is read until the stream is polled, and polling stops
/// pulling further chunks the moment a consumer stops polling — there is no
/// internal buffering beyond what the connection's own accumulator already
/// holds.
pub fn read_flow<'a>(
    conn: &'a Connection,
    ctx: &'a CallContext,
) -> impl Stream<Item = Result<Bytes>> + 'a {
    try_stream! {
        while let Some(chunk) = conn.next_chunk(ctx).await? {
            yield chunk;
        }
    }
}

/// Decodes [`read_flow`] as UTF-8 text, carrying any trailing incomplete
/// multi-byte sequence over to the next chunk rather than erroring on a
/// split codepoint at a chunk boundary. A source that ends mid-sequence
/// surfaces `SocketError::Unsupported`.
pub fn read_flow_string<'a>(
    conn: &'a Connection,
    ctx: &'a CallContext,
) -> impl Stream<Item = Result<String>> + 'a {
    try_stream! {
        let mut pending = BytesMut::new();
        while let Some(chunk) = conn.next_chunk(ctx).await? {
            pending.extend_from_slice(&chunk);
            let valid_up_to = match std::str::from_utf8(&pending) {
                Ok(text) => {
                    yield text.to_string();
                    pending.clear();
                    continue;
                }
                Err(err) => err.valid_up_to(),
            };
            if valid_up_to > 0 {
                let text = std::str::from_utf8(&pending[..valid_up_to])
                    .expect("valid_up_to always bounds a valid prefix")
                    .to_string();
                let remainder = pending.split_off(valid_up_to);
                pending = remainder;
                yield text;
            }
        }
        if !pending.is_empty() {
            Err(SocketError::unsupported("stream ended mid UTF-8 sequence"))?;
        }
    }
}

/// Splits [`read_flow`] into lines on `\n`, stripping a preceding `\r` if
/// present. A trailing partial line with no terminator is dropped when the
/// source reaches EOF rather than yielded — callers that need the final
/// partial line should read the remainder via [`Connection::next_chunk`]
/// directly instead of through this helper.
pub fn read_lines<'a>(
    conn: &'a Connection,
    ctx: &'a CallContext,
) -> impl Stream<Item = Result<String>> + 'a {
    try_stream! {
        let mut pending = BytesMut::new();
        while let Some(chunk) = conn.next_chunk(ctx).await? {
            pending.extend_from_slice(&chunk);
            loop {
                let Some(newline_pos) = pending.iter().position(|&b| b == b'\n') else {
                    break;
                };
                let mut line = pending.split_to(newline_pos);
                pending.split_to(1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                let line = String::from_utf8(line.to_vec())
                    .map_err(|_| SocketError::unsupported("line is not valid UTF-8"))?;
                yield line;
            }
        }
    }
}

/// Applies `transform` to every chunk of `source`, short-circuiting on the
/// first error either side produces.
pub fn map_buffer<'a, S>(
    source: S,
    mut transform: impl FnMut(Bytes) -> Result<Bytes> + 'a,
) -> impl Stream<Item = Result<Bytes>> + 'a
where
    S: Stream<Item = Result<Bytes>> + 'a,
{
    try_stream! {
        futures_util::pin_mut!(source);
        while let Some(chunk) = futures_util::StreamExt::next(&mut source).await {
            yield transform(chunk?)?;
        }
    }
}
