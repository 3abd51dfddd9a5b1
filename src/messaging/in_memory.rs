use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::sidecar::{InvokeResponse, Sidecar, SidecarError};
use crate::utils::CircuitState;

/// In-process sidecar double. Records every call; `set_failing(true)`
/// makes every call fail as if the sidecar were down.
#[derive(Default)]
pub struct InMemorySidecar {
    published: Mutex<Vec<(String, String, Value)>>,
    state: Mutex<HashMap<String, Value>>,
    invocations: Mutex<Vec<(String, String, Value)>>,
    failing: AtomicBool,
}

impl InMemorySidecar {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, String, Value)> {
        self.published.lock().unwrap().clone()
    }

    /// Event labels of everything published, in order
    pub fn published_events(&self) -> Vec<String> {
        self.published()
            .into_iter()
            .map(|(_, _, data)| data["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn invocations(&self) -> Vec<(String, String, Value)> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().get(key).cloned()
    }

    pub fn put_state(&self, key: &str, value: Value) {
        self.state.lock().unwrap().insert(key.to_string(), value);
    }

    fn check(&self, operation: &'static str) -> Result<(), SidecarError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SidecarError::Status {
                operation,
                status: 500,
                body: "sidecar down".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Sidecar for InMemorySidecar {
    async fn publish_event(&self, pubsub: &str, topic: &str, data: &Value) -> Result<(), SidecarError> {
        self.check("publish")?;
        self.published
            .lock()
            .unwrap()
            .push((pubsub.to_string(), topic.to_string(), data.clone()));
        Ok(())
    }

    async fn save_state(&self, _store: &str, key: &str, value: &Value) -> Result<(), SidecarError> {
        self.check("save_state")?;
        self.put_state(key, value.clone());
        Ok(())
    }

    async fn get_state(&self, _store: &str, key: &str) -> Result<Option<Value>, SidecarError> {
        self.check("get_state")?;
        Ok(self.stored(key))
    }

    async fn delete_state(&self, _store: &str, key: &str) -> Result<(), SidecarError> {
        self.check("delete_state")?;
        self.state.lock().unwrap().remove(key);
        Ok(())
    }

    async fn invoke_method(
        &self,
        app_id: &str,
        method: &str,
        data: &Value,
    ) -> Result<InvokeResponse, SidecarError> {
        self.check("invoke")?;
        self.invocations
            .lock()
            .unwrap()
            .push((app_id.to_string(), method.to_string(), data.clone()));
        Ok(InvokeResponse {
            status: 200,
            body: String::new(),
        })
    }

    async fn circuit_state(&self) -> CircuitState {
        if self.failing.load(Ordering::SeqCst) {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }
}
