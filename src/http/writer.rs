use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Chunk size for streaming file bodies.
const BUFFER_SIZE: usize = 8192;

/// Streams a [`Response`] to a peer: the buffered head first, then the body
/// until exhausted.
///
/// `written` counts bytes accepted by the peer so far, so a failure partway
/// through can still report how much went out.
pub struct ResponseWriter {
    response: Response,
    written: u64,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let head = self.response.head.clone();
        write_counted(stream, &head, &mut self.written).await?;

        if let Some(body) = self.response.body.as_mut() {
            copy_body(body, stream, &mut self.written).await?;
        }

        stream.flush().await?;
        Ok(self.written)
    }
}

async fn write_counted<W>(stream: &mut W, mut buf: &[u8], written: &mut u64) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while !buf.is_empty() {
        let n = stream.write(buf).await?;

        if n == 0 {
            return Err(anyhow::anyhow!("connection closed while writing"));
        }

        *written += n as u64;
        buf = &buf[n..];
    }

    Ok(())
}

async fn copy_body<R, W>(body: &mut R, stream: &mut W, written: &mut u64) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; BUFFER_SIZE];
    loop {
        let n = body.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        write_counted(stream, &chunk[..n], written).await?;
    }
}
