//! `Network` implementation that runs blocking fetches on worker threads.

use crate::NavigationRequest;
use crate::NavigationResponse;
use crate::Network;
use crate::client::Http11Client;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use glue_core::GlueError;
use glue_core::GlueResult;
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Runs each request on its own thread and completes the future through a
/// oneshot channel, so the router's executor never blocks on I/O.
#[derive(Debug, Clone)]
pub struct ThreadedNetwork {
    client: Arc<Http11Client>,
}

impl ThreadedNetwork {
    pub fn new(client: Http11Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Http11Client {
        &self.client
    }
}

impl Network for ThreadedNetwork {
    fn send(
        &self,
        request: NavigationRequest,
    ) -> LocalBoxFuture<'static, GlueResult<NavigationResponse>> {
        let (sender, receiver) = oneshot::channel();
        let client = Arc::clone(&self.client);
        let url = request.url.clone();

        let spawned = thread::Builder::new()
            .name("glue-fetch".to_owned())
            .spawn(move || {
                let result = client.fetch(&request);
                if sender.send(result).is_err() {
                    warn!(
                        url = request.url.as_str(),
                        "navigation response dropped: receiver gone"
                    );
                }
            });

        if let Err(error) = spawned {
            return async move {
                Err(GlueError::network(
                    "net.worker.spawn_failed",
                    format!("failed to start fetch worker for `{url}`: {error}"),
                ))
            }
            .boxed_local();
        }

        async move {
            receiver.await.map_err(|_| {
                GlueError::network(
                    "net.worker.cancelled",
                    format!("fetch worker for `{url}` exited without a response"),
                )
            })?
        }
        .boxed_local()
    }
}
