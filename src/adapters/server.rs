use std::{future::IntoFuture, io, sync::Arc, time::Duration};

use axum::Router;
use tokio::{net::TcpListener, sync::Notify};
use tracing::{info, warn};

/// Serves `router` until `signal` resolves, then lets in-flight requests
/// finish for at most `grace` before returning.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    grace: Duration,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let draining = Arc::new(Notify::new());

    let server = axum::serve(listener, router).with_graceful_shutdown({
        let draining = draining.clone();
        async move {
            signal.await;
            info!("Draining in-flight requests for up to {:?}", grace);
            draining.notify_one();
        }
    });

    tokio::select! {
        result = server.into_future() => result,
        () = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Requests still running after {:?}, stopping without them", grace);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_stops_after_signal_when_idle() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "ok" }));
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            router,
            async {
                let _ = rx.await;
            },
            Duration::from_secs(30),
        ));
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop right away")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_hung_request_does_not_block_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let entered = Arc::new(Notify::new());
        let router = Router::new().route(
            "/hang",
            get({
                let entered = entered.clone();
                move || {
                    let entered = entered.clone();
                    async move {
                        entered.notify_one();
                        std::future::pending::<&'static str>().await
                    }
                }
            }),
        );
        let (tx, rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            router,
            async {
                let _ = rx.await;
            },
            Duration::from_millis(200),
        ));
        let client = tokio::spawn(reqwest::get(format!("http://{}/hang", addr)));

        entered.notified().await;
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop once the grace period is over")
            .unwrap();
        assert!(result.is_ok());

        client.abort();
    }
}
