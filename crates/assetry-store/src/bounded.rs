//! Size-bounded copying from an upload stream.

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{StoreError, StoreResult};
use crate::traits::UploadSource;

/// Read buffer size for streaming uploads.
pub const COPY_CHUNK: usize = 64 * 1024;

/// Reject a declared size that is already over the limit.
pub fn check_hint(size_hint: Option<u64>, limit: u64) -> StoreResult<()> {
    match size_hint {
        Some(hint) if hint > limit => Err(StoreError::SizeExceeded { limit }),
        _ => Ok(()),
    }
}

/// Copy `reader` into `writer`, failing as soon as more than `limit` bytes
/// have been read.
///
/// The running total is checked after every chunk, before the chunk is
/// written, so at most `limit` bytes ever reach `writer` and memory use is
/// bounded by [`COPY_CHUNK`]. Read errors are reported as
/// [`StoreError::ContentRead`], write errors as [`StoreError::Io`].
pub async fn copy_bounded<W>(
    reader: &mut UploadSource<'_>,
    writer: &mut W,
    limit: u64,
) -> StoreResult<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await.map_err(StoreError::ContentRead)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        if total > limit {
            return Err(StoreError::SizeExceeded { limit });
        }
        writer.write_all(&buf[..n]).await?;
    }
    writer.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    /// Endless stream of zeros that counts how much was pulled from it.
    struct Endless {
        served: u64,
    }

    impl AsyncRead for Endless {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let n = buf.remaining();
            buf.put_slice(&vec![0u8; n]);
            self.served += n as u64;
            Poll::Ready(Ok(()))
        }
    }

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        }
    }

    #[tokio::test]
    async fn copies_under_limit() {
        let mut src: &[u8] = b"hello world";
        let mut out = Vec::new();
        let n = copy_bounded(&mut src, &mut out, 11).await.unwrap();
        assert_eq!(n, 11);
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn stops_at_limit_without_draining() {
        let mut src = Endless { served: 0 };
        let mut out = Vec::new();
        let err = copy_bounded(&mut src, &mut out, 100_000).await.unwrap_err();
        assert!(matches!(err, StoreError::SizeExceeded { limit: 100_000 }));
        assert!(out.len() as u64 <= 100_000);
        assert!(src.served <= 100_000 + COPY_CHUNK as u64);
    }

    #[tokio::test]
    async fn read_errors_are_content_errors() {
        let mut out = Vec::new();
        let err = copy_bounded(&mut Broken, &mut out, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::ContentRead(_)));
    }

    #[test]
    fn hint_over_limit_is_rejected() {
        assert!(check_hint(None, 10).is_ok());
        assert!(check_hint(Some(10), 10).is_ok());
        assert!(matches!(
            check_hint(Some(11), 10),
            Err(StoreError::SizeExceeded { limit: 10 })
        ));
    }
}
