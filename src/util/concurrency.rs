//! Bounded-concurrency helpers for batch hydration of per-id lookups.

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Maps `items` through an async `task` with at most `max_concurrency`
/// invocations in flight. Results keep the input order.
///
/// Used for per-series and per-player hydration where an unbounded
/// `join_all` would hammer the upstream API.
pub async fn map_with_concurrency<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrency: usize,
    task: F,
) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let futures = items.into_iter().map(|item| {
        let semaphore = Arc::clone(&semaphore);
        let fut = task(item);
        async move {
            // Semaphore is never closed, acquire cannot fail.
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            fut.await
        }
    });

    futures::future::join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let results = map_with_concurrency(vec![3u64, 1, 2], 2, |n| async move {
            tokio::time::sleep(std::time::Duration::from_millis(n * 5)).await;
            n * 10
        })
        .await;
        assert_eq!(results, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let active_ref = Arc::clone(&active);
        let peak_ref = Arc::clone(&peak);
        let _ = map_with_concurrency(vec![(); 8], 2, move |_| {
            let active = Arc::clone(&active_ref);
            let peak = Arc::clone(&peak_ref);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<i32> = map_with_concurrency(Vec::new(), 4, |n: i32| async move { n }).await;
        assert!(results.is_empty());
    }
}
