use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Encodes `resp` for the wire.
///
/// Header lines go out in the order they are stored, one line per entry, so
/// repeated headers such as `Set-Cookie` reach the client unmerged.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let head_len: usize = resp
        .headers
        .iter()
        .map(|(k, v)| k.len() + v.len() + 4)
        .sum();
    let mut buf = BytesMut::with_capacity(32 + head_len + resp.body.len());

    buf.put_slice(
        format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            resp.status.as_u16(),
            resp.status.reason_phrase()
        )
        .as_bytes(),
    );

    for (name, value) in &resp.headers {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(b"\r\n");
    buf.put_slice(&resp.body);

    buf.to_vec()
}

/// A serialized response that may be written out over several calls.
pub struct ResponseWriter {
    pending: Bytes,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            pending: Bytes::from(serialize_response(response)),
        }
    }

    /// Bytes still to be written.
    pub fn remaining(&self) -> usize {
        self.pending.remaining()
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.pending.has_remaining() {
            let n = stream.write(self.pending.chunk()).await?;
            if n == 0 {
                anyhow::bail!("client closed the connection mid-response");
            }
            self.pending.advance(n);
        }

        stream.flush().await?;
        Ok(())
    }
}
