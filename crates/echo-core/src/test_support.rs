//! Shared helpers for tests that talk to a mock backend.

use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::models::UserRecord;
use crate::navigation::Navigator;

pub const TEST_TOKEN: &str = "at_test";

/// Serve `app` on an ephemeral port and return its `/api` base URL.
pub async fn spawn_backend(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

pub fn test_user(id: i64, username: &str) -> UserRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
    }))
    .unwrap()
}

/// Remembers every redirect instead of performing it.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}
