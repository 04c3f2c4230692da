use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::HandlerError;
use crate::handlers::handler::JobHandler;

/// Stand-in generator: waits `latency`, then echoes the query.
///
/// Returns `{"answer": "Echo: <query>"}`. Used by the server binary until a
/// real generator is plugged in.
#[derive(Debug, Clone)]
pub struct EchoHandler {
    latency: Duration,
}

impl EchoHandler {
    /// Echo handler with the given simulated latency.
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl JobHandler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, query: &str) -> Result<Value, HandlerError> {
        tokio::time::sleep(self.latency).await;
        Ok(json!({ "answer": format!("Echo: {query}") }))
    }
}
