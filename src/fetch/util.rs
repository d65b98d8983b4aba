use std::num::NonZeroUsize;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::fetch::error::FetchError;

/// Copies `reader` into `writer` through a fixed size buffer, calling
/// `on_progress` with the cumulative byte count after every chunk written
pub async fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: NonZeroUsize,
    mut on_progress: F,
) -> Result<u64, FetchError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(u64),
{
    let mut buffer = vec![0u8; buffer_size.get()];
    let mut transferred = 0u64;

    loop {
        let count = reader.read(&mut buffer).await.map_err(FetchError::Read)?;
        if count == 0 {
            break;
        }

        writer.write_all(&buffer[..count]).await.map_err(FetchError::Write)?;
        transferred += count as u64;
        on_progress(transferred);
    }

    writer.flush().await.map_err(FetchError::Write)?;

    Ok(transferred)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Yields `ok_chunks` reads of `data` then fails
    struct BrokenReader {
        data: Vec<u8>,
        ok_chunks: usize,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.ok_chunks == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
            }

            self.ok_chunks -= 1;
            let len = self.data.len().min(buf.remaining());
            buf.put_slice(&self.data[..len]);
            Poll::Ready(Ok(()))
        }
    }

    /// Accepts `capacity` bytes in total then fails every write
    struct BrokenWriter {
        written: Vec<u8>,
        capacity: usize,
    }

    impl AsyncWrite for BrokenWriter {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            let room = self.capacity - self.written.len();
            if room == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk gone")));
            }

            let len = room.min(buf.len());
            self.written.extend_from_slice(&buf[..len]);
            Poll::Ready(Ok(len))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn should_copy_in_bounded_chunks() {
        let source: Vec<u8> = (0..25_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = source.as_slice();
        let mut written = Vec::new();
        let mut reports = Vec::new();

        let total = copy_with_progress(
            &mut reader,
            &mut written,
            NonZeroUsize::new(10_000).unwrap(),
            |n| reports.push(n),
        )
        .await
        .unwrap();

        assert_eq!(total, 25_000);
        assert_eq!(written, source);
        assert_eq!(reports, vec![10_000, 20_000, 25_000]);
    }

    #[tokio::test]
    async fn should_not_report_for_empty_body() {
        let mut reader: &[u8] = &[];
        let mut written = Vec::new();
        let mut reports = Vec::new();

        let total = copy_with_progress(&mut reader, &mut written, NonZeroUsize::new(8).unwrap(), |n| reports.push(n))
            .await
            .unwrap();

        assert_eq!(total, 0);
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn should_stop_on_read_error() {
        let mut reader = BrokenReader { data: vec![7; 4], ok_chunks: 2 };
        let mut written = Vec::new();
        let mut reports = Vec::new();

        let result = copy_with_progress(&mut reader, &mut written, NonZeroUsize::new(4).unwrap(), |n| reports.push(n)).await;

        assert!(matches!(result, Err(FetchError::Read(_))));
        assert_eq!(written.len(), 8);
        assert_eq!(reports, vec![4, 8]);
    }

    #[tokio::test]
    async fn should_stop_on_write_error() {
        let source = [3u8; 12];
        let mut reader = &source[..];
        let mut writer = BrokenWriter { written: Vec::new(), capacity: 6 };
        let mut reports = Vec::new();

        let result = copy_with_progress(&mut reader, &mut writer, NonZeroUsize::new(4).unwrap(), |n| reports.push(n)).await;

        assert!(matches!(result, Err(FetchError::Write(ref err)) if err.kind() == io::ErrorKind::BrokenPipe));
        // Second chunk was only half written, so it is never reported
        assert_eq!(reports, vec![4]);
        assert_eq!(writer.written.len(), 6);
    }
}
