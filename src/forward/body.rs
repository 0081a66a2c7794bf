//! Bounded-chunk relay of origin response bodies.
//!
//! The origin body is pulled only when the server polls for the next chunk,
//! so a slow caller throttles reads from the origin. At most one origin read
//! is held at a time and it is handed out in slices of at most `chunk_size`
//! bytes; slicing a `Bytes` shares the buffer instead of copying it.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

/// Stream adapter that re-chunks an inner byte stream into pieces no larger
/// than a fixed size. Finite and not restartable: once the inner stream ends
/// or fails, this stream ends.
pub struct ChunkedBody<S> {
    inner: S,
    pending: Bytes,
    chunk_size: usize,
    finished: bool,
}

impl<S> ChunkedBody<S> {
    pub fn new(inner: S, chunk_size: usize) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
            finished: false,
        }
    }
}

impl<S, E> Stream for ChunkedBody<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if !this.pending.is_empty() {
                let take = this.pending.len().min(this.chunk_size);
                return Poll::Ready(Some(Ok(this.pending.split_to(take))));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(bytes)) => this.pending = bytes,
                Some(Err(err)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{stream, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static BLOCK: [u8; 64 * 1024] = [7u8; 64 * 1024];

    #[tokio::test]
    async fn test_splits_large_reads() {
        let inner = stream::iter(vec![Ok::<_, ()>(Bytes::from(vec![1u8; 20_000]))]);
        let sizes: Vec<usize> = ChunkedBody::new(inner, 8192)
            .map(|chunk| chunk.unwrap().len())
            .collect()
            .await;
        assert_eq!(sizes, vec![8192, 8192, 3616]);
    }

    #[tokio::test]
    async fn test_small_and_empty_reads_pass_through() {
        let inner = stream::iter(vec![
            Ok::<_, ()>(Bytes::from_static(b"ab")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"cde")),
        ]);
        let chunks: Vec<Bytes> = ChunkedBody::new(inner, 8192)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cde")]);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let inner = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err("reset"),
            Ok(Bytes::from_static(b"never")),
        ]);
        let items: Vec<_> = ChunkedBody::new(inner, 2).collect().await;
        assert_eq!(
            items,
            vec![
                Ok(Bytes::from_static(b"ab")),
                Ok(Bytes::from_static(b"c")),
                Err("reset"),
            ]
        );
    }

    #[tokio::test]
    async fn test_large_body_is_pulled_lazily_in_bounded_chunks() {
        const TOTAL: usize = 50 * 1024 * 1024;
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let inner = stream::iter(0..TOTAL / BLOCK.len()).map(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(Bytes::from_static(&BLOCK))
        });

        let mut body = ChunkedBody::new(inner, 8192);

        // The first chunk needs exactly one origin read.
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 8192);
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        let mut total = first.len();
        let mut largest = first.len();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.unwrap();
            largest = largest.max(chunk.len());
            total += chunk.len();
            // Never more than one origin read ahead of what was handed out.
            assert!(reads.load(Ordering::SeqCst) * BLOCK.len() - total < BLOCK.len());
        }

        assert_eq!(total, TOTAL);
        assert_eq!(largest, 8192);
        assert!(body.next().await.is_none());
    }
}
