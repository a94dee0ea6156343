//! Blocking bridge for synchronous callers
//!
//! Owns a single-worker Tokio runtime. Must not be used from inside another
//! async runtime; `block_on` panics there.

use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Synchronous handle around an async client
pub struct BlockingClient<C> {
    client: C,
    runtime: Option<Runtime>,
}

impl<C> BlockingClient<C> {
    pub fn new(client: C) -> ClientResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("model-registry-client")
            .enable_all()
            .build()
            .map_err(|e| ClientError::Config(format!("cannot start runtime: {}", e)))?;
        Ok(Self {
            client,
            runtime: Some(runtime),
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Drive an arbitrary future to completion on the owned runtime
    pub fn block_on<F: Future>(&self, future: F) -> ClientResult<F::Output> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| ClientError::Config("runtime has been shut down".to_string()))?;
        Ok(runtime.block_on(future))
    }

    /// Run one client call, e.g. `blocking.call(|c| c.get_registered_model("1"))`
    pub fn call<'a, F, Fut, T>(&'a self, f: F) -> ClientResult<T>
    where
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        self.block_on(f(&self.client))?
    }

    /// Stop the runtime, waiting briefly for in-flight tasks.
    ///
    /// The wrapped client stays reachable through [`BlockingClient::client`];
    /// later calls fail with [`ClientError::Config`]. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!("Shutting down blocking client runtime");
            runtime.shutdown_timeout(Duration::from_secs(5));
        }
    }
}

impl<C> Drop for BlockingClient<C> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for BlockingClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("client", &self.client)
            .field("running", &self.runtime.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Echo {
        async fn echo(&self, value: u32) -> ClientResult<u32> {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(value)
        }
    }

    #[test]
    fn test_call_runs_async_method() {
        let mut blocking = BlockingClient::new(Echo).unwrap();
        assert_eq!(blocking.call(|c| c.echo(7)).unwrap(), 7);
        assert_eq!(blocking.call(|c| c.echo(8)).unwrap(), 8);
        blocking.shutdown();
    }

    #[test]
    fn test_calls_after_shutdown_fail() {
        let mut blocking = BlockingClient::new(Echo).unwrap();
        blocking.shutdown();
        blocking.shutdown();

        let err = blocking.call(|c| c.echo(1)).unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("shut down")));
        assert!(blocking.block_on(async {}).is_err());
    }

    #[test]
    fn test_errors_pass_through() {
        let blocking = BlockingClient::new(Echo).unwrap();
        let result: ClientResult<()> =
            blocking.call(|_| async { Err(ClientError::Pagination("loop".into())) });
        assert!(matches!(result, Err(ClientError::Pagination(_))));
    }

    #[test]
    fn test_drop_without_shutdown() {
        let blocking = BlockingClient::new(Echo).unwrap();
        let _ = blocking.block_on(async { 1 + 1 }).unwrap();
        drop(blocking);
    }
}
