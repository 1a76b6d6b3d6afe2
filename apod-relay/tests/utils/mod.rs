use apod_relay::{FixedSaveDir, Relay, RelayConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Fresh directory under the system temp dir, unique per call.
pub fn temp_save_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("apod-relay-{}-{}-{}", label, std::process::id(), n))
}

pub struct TestRelay {
    pub addr: SocketAddr,
    pub save_dir: PathBuf,
    stop: Option<oneshot::Sender<()>>,
}

impl TestRelay {
    pub async fn start(label: &str) -> Self {
        let save_dir = temp_save_dir(label);
        let config = RelayConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            save_dir: save_dir.clone(),
            ..RelayConfig::default()
        };

        let relay = Relay::bind(config, Arc::new(FixedSaveDir))
            .await
            .expect("Failed to bind relay");
        let addr = relay.local_addr().expect("Relay has no local address");

        let (stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(relay.run(async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            save_dir,
            stop: Some(stop),
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = std::fs::remove_dir_all(&self.save_dir);
    }
}
