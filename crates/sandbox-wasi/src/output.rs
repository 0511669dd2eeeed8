use tokio::io::{AsyncRead, AsyncReadExt};

/// Read `reader` to EOF, keeping at most `cap` bytes.
///
/// The stream is always consumed in full so the child never blocks on a
/// full pipe buffer; bytes past the cap are discarded as they arrive, never
/// accumulated. Read errors keep whatever was captured so far — after the
/// process has exited there is nothing useful left to surface.
///
/// Returns the captured prefix and whether anything was discarded.
pub(crate) async fn drain_capped<R>(mut reader: R, cap: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let Some(read) = chunk.get(..n) else { break };

        if truncated {
            continue;
        }
        let remaining = cap.saturating_sub(captured.len());
        if read.len() <= remaining {
            captured.extend_from_slice(read);
        } else {
            if let Some(head) = read.get(..remaining) {
                captured.extend_from_slice(head);
            }
            truncated = true;
        }
    }

    (captured, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_stream_is_kept_whole() {
        let (bytes, truncated) = drain_capped(&b"hello"[..], 100).await;
        assert_eq!(bytes, b"hello");
        assert!(!truncated);
    }

    #[tokio::test]
    async fn stream_at_exactly_the_cap_is_not_truncated() {
        let (bytes, truncated) = drain_capped(&b"12345678"[..], 8).await;
        assert_eq!(bytes, b"12345678");
        assert!(!truncated);
    }

    #[tokio::test]
    async fn long_stream_is_cut_at_exactly_the_cap() {
        let input = vec![b'x'; 100_000];
        let (bytes, truncated) = drain_capped(&input[..], 1024).await;
        assert_eq!(bytes.len(), 1024);
        assert!(truncated);
    }

    #[tokio::test]
    async fn zero_cap_discards_everything() {
        let (bytes, truncated) = drain_capped(&b"data"[..], 0).await;
        assert!(bytes.is_empty());
        assert!(truncated);
    }

    #[tokio::test]
    async fn empty_stream() {
        let (bytes, truncated) = drain_capped(&b""[..], 8).await;
        assert!(bytes.is_empty());
        assert!(!truncated);
    }
}
