//! Fan-in of concurrently running loop tasks.

use std::future::Future;

use tokio::task::JoinSet;

use super::TransportError;

/// Run every future as its own task and wait for all of them.
///
/// Succeeds only if every task succeeds. Otherwise returns the error of the
/// task that failed first; later failures are dropped. A task that panics or
/// is cancelled counts as [`TransportError::TaskFailed`].
pub(crate) async fn join_first_error<I, F>(tasks: I) -> Result<(), TransportError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task);
    }

    let mut outcome = Ok(());
    while let Some(joined) = set.join_next().await {
        let result =
            joined.unwrap_or_else(|err| Err(TransportError::TaskFailed(err.to_string())));
        if let Err(err) = result {
            if outcome.is_ok() {
                outcome = Err(err);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::time::Duration;

    use super::*;

    type LoopFuture = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send>>;

    fn after(millis: u64, result: Result<(), TransportError>) -> LoopFuture {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            result
        })
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let result = join_first_error([after(5, Ok(())), after(1, Ok(()))]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_first_failure_wins() {
        let result = join_first_error([
            after(40, Err(TransportError::TaskFailed("late".into()))),
            after(1, Err(TransportError::AlreadyStarted)),
        ])
        .await;

        assert!(matches!(result, Err(TransportError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn test_waits_for_every_task() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let slow: LoopFuture = Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
            Ok(())
        });

        let result = join_first_error([after(0, Err(TransportError::AlreadyStarted)), slow]).await;

        assert!(result.is_err());
        assert!(rx.await.is_ok(), "slow task must have completed");
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let panicking: LoopFuture = Box::pin(async {
            if true {
                panic!("loop exploded");
            }
            Ok(())
        });
        let result = join_first_error([panicking, after(1, Ok(()))]).await;

        assert!(matches!(result, Err(TransportError::TaskFailed(_))));
    }
}
