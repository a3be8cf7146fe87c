#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use wellpoints_core::auth::{Session, ACCESS_TOKEN_KEY, PROFILE_KEY, REFRESH_TOKEN_KEY};
use wellpoints_core::models::UserProfile;
use wellpoints_core::{ApiClient, MemoryStore, Navigator, Route, SecureStore};

/// Navigator that records every redirect
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
    tx: mpsc::UnboundedSender<Route>,
}

impl RecordingNavigator {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let navigator = Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            tx,
        });
        (navigator, rx)
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
        let _ = self.tx.send(route);
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        employee_id: "42".to_string(),
        name: "Ana Lima".to_string(),
        registration: "12345".to_string(),
        department: "Financeiro".to_string(),
    }
}

pub fn profile_json() -> Value {
    json!({
        "employee_id": "42",
        "name": "Ana Lima",
        "registration": "12345",
        "department": "Financeiro"
    })
}

pub fn overview_json() -> Value {
    json!({
        "profile": profile_json(),
        "points_balance": 150,
        "transactions": [
            {
                "id": "1",
                "type": "earn",
                "amount": 50,
                "description": "Check-in realizado",
                "date": "2025-02-08"
            }
        ]
    })
}

/// Store holding a signed-in session
pub fn signed_in_store(access: &str, refresh: Option<&str>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.set(ACCESS_TOKEN_KEY, access).unwrap();
    if let Some(refresh) = refresh {
        store.set(REFRESH_TOKEN_KEY, refresh).unwrap();
    }
    store
        .set(PROFILE_KEY, &serde_json::to_string(&profile()).unwrap())
        .unwrap();
    store
}

pub fn client(store: Arc<MemoryStore>, base_url: &str) -> ApiClient {
    let session = Arc::new(Session::new(store));
    ApiClient::with_base_url(session, base_url, Duration::from_secs(5)).unwrap()
}

/// Base URL nothing listens on
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
