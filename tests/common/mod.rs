//! Shared test utilities and the scripted serial device.

#![allow(dead_code, unused_imports)]

pub mod fake_device;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

use armlink::calibration::CalibrationStore;
use armlink::config::AuthConfig;
use armlink::link::{LinkSettings, SerialLink};
use armlink::server::routes::AppState;
use armlink::server::ApiServer;

use fake_device::{FakeBus, FakeDriver};

/// Production link settings with the timings shrunk for tests.
pub fn fast_settings() -> LinkSettings {
    LinkSettings {
        port: "/dev/ttyFAKE".to_string(),
        baud_rate: 9600,
        reconnect_interval: Duration::from_millis(50),
        response_timeout: Duration::from_millis(200),
        response_grace: Duration::from_millis(50),
        buffer_capacity: 100,
        history_capacity: 50,
    }
}

/// Wait for a server to accept connections.
pub async fn wait_for_server(addr: SocketAddr, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// A full stack on a loopback port: scripted device, serial link,
/// HTTP server. The static directory is a tempdir seeded with a stub
/// index page.
pub struct TestServer {
    pub addr: SocketAddr,
    pub link: SerialLink,
    pub bus: FakeBus,
    pub client: reqwest::Client,
    _static_dir: TempDir,
}

impl TestServer {
    /// Start in development mode with the link already connected.
    pub async fn start() -> Self {
        Self::start_with_auth(AuthConfig {
            development_mode: true,
            password: String::new(),
        })
        .await
    }

    pub async fn start_with_auth(auth: AuthConfig) -> Self {
        let bus = FakeBus::new();
        let link = SerialLink::new(Box::new(FakeDriver::new(bus.clone())), fast_settings());
        link.connect("/dev/ttyFAKE").await.expect("connect fake port");

        let static_dir = TempDir::new().expect("create temp static dir");
        std::fs::write(
            static_dir.path().join("index.html"),
            "<html>armlink panel</html>",
        )
        .expect("write stub index");

        let state = AppState {
            link: link.clone(),
            calibration: Arc::new(CalibrationStore::new(static_dir.path())),
            auth,
            static_dir: static_dir.path().to_path_buf(),
        };

        let mut server = ApiServer::new(state, "127.0.0.1:0".parse().unwrap());
        let addr = server.try_bind().await.expect("bind test server");
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        assert!(wait_for_server(addr, Duration::from_secs(2)).await);

        Self {
            addr,
            link,
            bus,
            client: reqwest::Client::new(),
            _static_dir: static_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
            .json()
            .await
            .expect("response was not JSON")
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("request failed")
    }
}
