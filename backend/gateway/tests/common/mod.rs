use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crossgrid_core::{FsStorage, GameStore};
use crossgrid_gateway::{serve, GatewaySettings, GatewayState, SessionManager, SessionSettings};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: tempfile::TempDir,
    stop: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(GatewaySettings {
            max_upload_bytes: 4096,
            ..Default::default()
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn start_with_ping_interval(ping_interval: Duration) -> Self {
        Self::start_with(GatewaySettings {
            ping_interval,
            ..Default::default()
        })
        .await
    }

    async fn start_with(settings: GatewaySettings) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(Arc::new(FsStorage), dir.path());
        let sessions = SessionManager::new(store, SessionSettings::default());
        let state = GatewayState::new(sessions, settings);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, state, async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            dir,
            stop: Some(stop),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn ws_url(&self, name: &str) -> String {
        format!("ws://{}/ws/{}", self.addr, name)
    }

    /// Write a blank board file straight into the data directory.
    #[allow(dead_code)]
    pub fn seed_game(&self, name: &str, width: u32, height: u32) {
        let layout = crossgrid_core::Layout {
            width,
            height,
            grid: vec![false; (width * height) as usize],
        };
        let board = crossgrid_core::Board::from_layout(&layout).unwrap();
        std::fs::write(
            self.dir.path().join(format!("{name}.json")),
            board.to_vec().unwrap(),
        )
        .unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
