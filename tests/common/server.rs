//! Mock API server lifecycle management
//!
//! Binds to a random loopback port and serves whatever router the test
//! hands in. Shuts down when dropped.

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub struct MockServer {
    /// Base URL for requests (e.g. "http://127.0.0.1:12345")
    pub base_url: String,

    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    /// Spawns the router on a random port and waits until it is bound.
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr = listener.local_addr().expect("mock server has no address");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("mock server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
