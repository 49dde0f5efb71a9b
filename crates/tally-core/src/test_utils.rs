//! Test utilities for tally-core
//!
//! A mock Ollama server for exercising the HTTP classifier, plus helpers for
//! building aggregator input.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::Json,
    routing::post,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::{Direction, TransactionRecord};

/// Mock Ollama server for testing and development
///
/// Classifies by keyword on the `Message:` line of the prompt. A message
/// containing "malformed" gets a non-JSON answer and one containing "slow"
/// is answered after two seconds (both case-insensitive).
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new().route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama generate endpoint
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let message = extract_message_from_prompt(&request.prompt).to_lowercase();

    if message.contains("slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let response = if message.contains("malformed") {
        "I am not sure what this is.".to_string()
    } else {
        // Models like to chat around the JSON
        format!(
            "Here is the category: {{\"category\": \"{}\"}}",
            classify_message_mock(&message)
        )
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Keyword classification standing in for a model
fn classify_message_mock(m: &str) -> &'static str {
    if m.contains("cinema") || m.contains("movie") || m.contains("concert") {
        "entertainment"
    } else if m.contains("petrol") || m.contains("fuel") || m.contains("metro") {
        "transport"
    } else if m.contains("vegetable") || m.contains("milk") {
        "groceries"
    } else if m.contains("school") || m.contains("course") {
        "education"
    } else if m.contains("lunch") || m.contains("dinner") {
        "dining"
    } else {
        "other"
    }
}

/// Extract the message from the classifier prompt
fn extract_message_from_prompt(prompt: &str) -> String {
    if let Some(start) = prompt.find("Message: ") {
        let after_start = &prompt[start + 9..];
        let end = after_start.find('\n').unwrap_or(after_start.len());
        return after_start[..end].trim().to_string();
    }
    prompt.to_string()
}

/// Build an aggregator row
pub fn record(
    date: (i32, u32, u32),
    amount: f64,
    direction: Direction,
    category: &str,
    merchant: &str,
) -> TransactionRecord {
    TransactionRecord {
        amount: Some(amount),
        direction,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        category: Some(category.to_string()),
        merchant: Some(merchant.to_string()),
    }
}

/// Build a debit row
pub fn spend(date: (i32, u32, u32), amount: f64, category: &str, merchant: &str) -> TransactionRecord {
    record(date, amount, Direction::Debit, category, merchant)
}

// Request/Response types for the mock server

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}
