//! Concurrent fan-out with per-item fallback.

use std::future::Future;

use futures::future::join_all;

/// Run every future concurrently and collect the results in input order.
///
/// A failed item is replaced by `fallback(index, error)`; it never affects
/// its siblings and the whole call never fails.
pub async fn gather_with_fallback<Fut, T, E, F>(operations: Vec<Fut>, mut fallback: F) -> Vec<T>
where
    Fut: Future<Output = Result<T, E>>,
    F: FnMut(usize, E) -> T,
{
    join_all(operations)
        .await
        .into_iter()
        .enumerate()
        .map(|(i, result)| result.unwrap_or_else(|e| fallback(i, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn order_is_preserved_despite_completion_order() {
        let ops: Vec<_> = [30u64, 0, 15]
            .into_iter()
            .map(|ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok::<u64, ()>(ms)
            })
            .collect();

        assert_eq!(gather_with_fallback(ops, |_, ()| 0).await, vec![30, 0, 15]);
    }

    #[tokio::test]
    async fn failures_fall_back_independently() {
        let ops: Vec<_> = (0..4)
            .map(|i| async move {
                if i % 2 == 1 {
                    Err(format!("falhou {i}"))
                } else {
                    Ok(format!("ok {i}"))
                }
            })
            .collect();

        let out = gather_with_fallback(ops, |i, e| format!("fallback {i}: {e}")).await;
        assert_eq!(
            out,
            vec!["ok 0", "fallback 1: falhou 1", "ok 2", "fallback 3: falhou 3"]
        );
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let ops: Vec<std::future::Ready<Result<u8, ()>>> = Vec::new();
        assert!(gather_with_fallback(ops, |_, ()| 0).await.is_empty());
    }
}
