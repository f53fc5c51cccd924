//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use metrica_fetch::{AuthorizationFlow, FetchContext, FetchContextBuilder, FetchError, Sleeper};
use metrica_store::MemoryCredentialStore;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

/// Records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Answers prompts from fixed values and counts them.
#[derive(Debug)]
pub struct CountingFlow {
    token: String,
    save: bool,
    pub code_prompts: AtomicUsize,
    pub save_prompts: AtomicUsize,
}

impl CountingFlow {
    pub fn new(token: &str, save: bool) -> Self {
        Self {
            token: token.to_string(),
            save,
            code_prompts: AtomicUsize::new(0),
            save_prompts: AtomicUsize::new(0),
        }
    }

    pub fn code_prompts(&self) -> usize {
        self.code_prompts.load(Ordering::SeqCst)
    }

    pub fn save_prompts(&self) -> usize {
        self.save_prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationFlow for CountingFlow {
    async fn prompt_for_code(&self, _authorize_url: &str) -> Result<String, FetchError> {
        self.code_prompts.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone())
    }

    async fn prompt_for_save_preference(&self, _path: &Path) -> Result<bool, FetchError> {
        self.save_prompts.fetch_add(1, Ordering::SeqCst);
        Ok(self.save)
    }
}

/// A builder pointed at the mock server, with a cached token and a
/// recording sleeper.
pub fn builder(server: &MockServer, sleeper: Arc<RecordingSleeper>) -> FetchContextBuilder {
    FetchContext::builder()
        .base_url(server.uri())
        .credential_store(Arc::new(MemoryCredentialStore::with_token(
            "metrica_token.json",
            TOKEN,
        )))
        .authorization_flow(Arc::new(CountingFlow::new("unexpected-prompt", false)))
        .sleeper(sleeper)
}

/// Builds a CSV body with a header line and `rows` data rows.
pub fn csv_page(header: &str, rows: usize) -> String {
    let mut body = String::with_capacity(header.len() + 1 + rows * 16);
    body.push_str(header);
    body.push('\n');
    for i in 0..rows {
        body.push_str(&format!("2024-01-01,{i}\n"));
    }
    body
}
