//! Single-shot deferred results for primitive work.
//!
//! A [`Deferred`] is issued only after all synchronous validation has passed. With a tokio
//! runtime in scope the work runs on the blocking pool; without one it runs inline and the
//! result is ready immediately. There is no cancellation and no timeout: dropping a `Deferred`
//! detaches the task, which still runs to completion.

use crate::error::CryptoError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

enum State<T> {
    Ready(Option<Result<T, CryptoError>>),
    Blocking(JoinHandle<Result<T, CryptoError>>),
}

/// The pending result of a primitive operation. Await it to obtain the value.
pub struct Deferred<T> {
    task: &'static str,
    state: State<T>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Issues `work` for `task`, on the blocking pool when a runtime is available.
    pub(crate) fn spawn<F>(task: &'static str, work: F) -> Self
    where
        F: FnOnce() -> Result<T, CryptoError> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                trace!(task, "Deferred task dispatched to blocking pool");
                Self { task, state: State::Blocking(handle.spawn_blocking(work)) }
            },
            Err(_) => {
                trace!(task, "No runtime in scope, running deferred task inline");
                Self::ready(task, work())
            },
        }
    }
}

impl<T> Deferred<T> {
    /// An already settled result.
    pub(crate) const fn ready(task: &'static str, result: Result<T, CryptoError>) -> Self {
        Self { task, state: State::Ready(Some(result)) }
    }

    /// Returns `true` once the result can be taken without waiting.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match &self.state {
            State::Ready(slot) => slot.is_some(),
            State::Blocking(handle) => handle.is_finished(),
        }
    }

    /// Takes a result that settled inline, for callers outside any async context.
    ///
    /// Returns `None` if the work was dispatched to the blocking pool.
    #[must_use]
    pub fn into_ready(self) -> Option<Result<T, CryptoError>> {
        match self.state {
            State::Ready(slot) => slot,
            State::Blocking(_) => None,
        }
    }
}

// The inner `JoinHandle` is `Unpin` and the ready slot is never pinned.
impl<T> Unpin for Deferred<T> {}

impl<T> Future for Deferred<T> {
    type Output = Result<T, CryptoError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let task = this.task;
        match &mut this.state {
            State::Ready(slot) => Poll::Ready(slot.take().unwrap_or_else(|| {
                Err(CryptoError::Internal {
                    message: "deferred result polled after completion".into(),
                    context: Some(task.into()),
                })
            })),
            State::Blocking(handle) => Pin::new(handle).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(CryptoError::Internal {
                        message: format!("deferred task failed: {e}").into(),
                        context: Some(task.into()),
                    })
                })
            }),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("task", &self.task)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_inline_without_runtime() {
        let deferred = Deferred::spawn("inline", || Ok(21 * 2));
        assert!(deferred.is_ready());
        assert_eq!(deferred.into_ready().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_inline_failure_is_preserved() {
        let deferred: Deferred<u8> =
            Deferred::spawn("inline", || Err(CryptoError::operation("primitive refused")));
        let err = deferred.into_ready().unwrap().unwrap_err();
        assert!(matches!(err, CryptoError::Operation { .. }));
    }

    #[tokio::test]
    async fn test_runs_on_blocking_pool_inside_runtime() {
        let deferred = Deferred::spawn("pooled", || Ok(vec![1u8, 2, 3]));
        assert_eq!(deferred.await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_pooled_result_is_not_available_synchronously() {
        let deferred = Deferred::spawn("pooled", || Ok(()));
        assert!(deferred.into_ready().is_none());
    }
}
