//! Budget-based furniture recommendation client
//!
//! Talks to the recommendation service over HTTP. Requests run on
//! detached threads so the render loop never blocks on the network;
//! each request hands back a channel the UI polls once per frame.
//! When several requests race, the one that resolves last wins.

use std::sync::mpsc::{self, Receiver};

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";
const TRANSPORT_ERROR_MESSAGE: &str =
    "Server error. Ensure the recommendation server is running.";

#[derive(Debug, Serialize)]
struct BudgetRequest {
    budget: f64,
}

#[derive(Debug, Deserialize)]
struct RecommendationList {
    recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// What a finished request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendOutcome {
    /// Furniture keys the service suggested for the budget.
    Items(Vec<String>),
    /// The service answered with an error body.
    ServiceError(String),
    /// The service could not be reached or sent garbage.
    Transport(String),
}

pub struct RecommendClient {
    endpoint: String,
}

impl RecommendClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Fires a request on a background thread. The returned receiver
    /// yields exactly one outcome when the request finishes.
    pub fn request(&self, budget: f64) -> Receiver<RecommendOutcome> {
        let (tx, rx) = mpsc::channel();
        let url = format!("{}/recommend", self.endpoint);

        std::thread::spawn(move || {
            let outcome = fetch(&url, budget);
            // The UI may have been torn down; a dead receiver is fine.
            let _ = tx.send(outcome);
        });

        rx
    }
}

fn fetch(url: &str, budget: f64) -> RecommendOutcome {
    let client = reqwest::blocking::Client::new();
    let response = match client.post(url).json(&BudgetRequest { budget }).send() {
        Ok(response) => response,
        Err(e) => {
            log::warn!("recommendation request failed: {}", e);
            return RecommendOutcome::Transport(TRANSPORT_ERROR_MESSAGE.to_string());
        }
    };

    if response.status().is_success() {
        match response.json::<RecommendationList>() {
            Ok(body) => RecommendOutcome::Items(body.recommendations),
            Err(e) => {
                log::warn!("malformed recommendation response: {}", e);
                RecommendOutcome::Transport(TRANSPORT_ERROR_MESSAGE.to_string())
            }
        }
    } else {
        match response.json::<ServiceErrorBody>() {
            Ok(body) => RecommendOutcome::ServiceError(body.error),
            Err(e) => {
                log::warn!("malformed error response: {}", e);
                RecommendOutcome::Transport(TRANSPORT_ERROR_MESSAGE.to_string())
            }
        }
    }
}

/// What the recommendation panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendDisplay {
    Empty,
    /// Draggable furniture keys.
    Items(Vec<String>),
    /// A message line, e.g. "Error: ...".
    Message(String),
}

/// Panel state: budget input, in-flight requests, and the last result.
pub struct RecommendPanelState {
    client: RecommendClient,
    pub budget_input: f32,
    pending: Vec<Receiver<RecommendOutcome>>,
    pub display: RecommendDisplay,
}

impl RecommendPanelState {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: RecommendClient::new(endpoint),
            budget_input: 0.0,
            pending: Vec::new(),
            display: RecommendDisplay::Empty,
        }
    }

    /// Submits the current budget. Non-positive budgets never reach
    /// the network.
    pub fn submit(&mut self) {
        if self.budget_input <= 0.0 {
            self.display = RecommendDisplay::Message("Please enter a valid budget.".to_string());
            return;
        }
        self.pending.push(self.client.request(self.budget_input as f64));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains finished requests. Later results overwrite earlier ones,
    /// so the display always reflects the most recently resolved
    /// request.
    pub fn poll(&mut self) {
        let mut still_pending = Vec::new();
        for rx in self.pending.drain(..) {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.display = match outcome {
                        RecommendOutcome::Items(items) => RecommendDisplay::Items(items),
                        RecommendOutcome::ServiceError(message) => {
                            RecommendDisplay::Message(format!("Error: {}", message))
                        }
                        RecommendOutcome::Transport(message) => {
                            RecommendDisplay::Message(message)
                        }
                    };
                }
                Err(mpsc::TryRecvError::Empty) => still_pending.push(rx),
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.display = RecommendDisplay::Message(
                        TRANSPORT_ERROR_MESSAGE.to_string(),
                    );
                }
            }
        }
        self.pending = still_pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    /// Answers one HTTP request with a canned response, then exits.
    fn canned_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    fn wait_for_result(panel: &mut RecommendPanelState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while panel.has_pending() && Instant::now() < deadline {
            panel.poll();
            std::thread::sleep(Duration::from_millis(10));
        }
        panel.poll();
    }

    #[test]
    fn test_successful_response_lists_items() {
        let endpoint = canned_server("200 OK", r#"{"recommendations":["bed","dining1"]}"#);
        let mut panel = RecommendPanelState::new(endpoint);
        panel.budget_input = 15000.0;
        panel.submit();
        wait_for_result(&mut panel);

        assert_eq!(
            panel.display,
            RecommendDisplay::Items(vec!["bed".to_string(), "dining1".to_string()])
        );
    }

    #[test]
    fn test_service_error_shown_with_prefix() {
        let endpoint = canned_server(
            "500 INTERNAL SERVER ERROR",
            r#"{"error":"no items for this budget"}"#,
        );
        let mut panel = RecommendPanelState::new(endpoint);
        panel.budget_input = 50.0;
        panel.submit();
        wait_for_result(&mut panel);

        assert_eq!(
            panel.display,
            RecommendDisplay::Message("Error: no items for this budget".to_string())
        );
    }

    #[test]
    fn test_unreachable_server_reports_transport_error() {
        // Port 9 (discard) is almost certainly closed
        let mut panel = RecommendPanelState::new("http://127.0.0.1:9");
        panel.budget_input = 1000.0;
        panel.submit();
        wait_for_result(&mut panel);

        assert_eq!(
            panel.display,
            RecommendDisplay::Message(TRANSPORT_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_non_positive_budget_never_hits_network() {
        let mut panel = RecommendPanelState::new("http://127.0.0.1:9");
        panel.budget_input = 0.0;
        panel.submit();

        assert!(!panel.has_pending());
        assert_eq!(
            panel.display,
            RecommendDisplay::Message("Please enter a valid budget.".to_string())
        );
    }
}
