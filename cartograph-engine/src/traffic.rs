use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;

/// URL fragments that mark an outbound request as API traffic.
const REQUEST_MARKERS: [&str; 5] = ["/api/", "graphql", "/v1/", "googleapis.com", "firebase"];

/// Narrower marker set applied to responses.
const RESPONSE_MARKERS: [&str; 4] = ["/api/", "graphql", "/v1/", "googleapis.com"];

/// Response half of a captured exchange, attached after pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body_prefix: String,
    pub received_at: String,
}

/// One captured request, optionally paired with its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub resource_type: String,
    pub requested_at: String,
    pub response: Option<ExchangeResponse>,
}

/// Events flowing from the fetch layer to the interceptor. The request
/// and response streams are independent; pairing happens on drain.
#[derive(Debug)]
pub enum TrafficEvent {
    Request {
        method: String,
        url: String,
        headers: BTreeMap<String, String>,
        body: Option<String>,
        resource_type: String,
    },
    Response {
        url: String,
        status: u16,
        status_text: String,
        headers: BTreeMap<String, String>,
        content_type: Option<String>,
        /// `None` means the body could not be decoded; the exchange keeps
        /// its request half and stays response-less.
        body: Option<String>,
    },
}

/// Cheap clone handed to the fetch layer. Sending never blocks the
/// underlying request.
#[derive(Clone)]
pub struct TrafficTap {
    tx: mpsc::UnboundedSender<TrafficEvent>,
}

impl TrafficTap {
    pub fn request(
        &self,
        method: &str,
        url: &str,
        headers: BTreeMap<String, String>,
        body: Option<String>,
        resource_type: &str,
    ) {
        let _ = self.tx.send(TrafficEvent::Request {
            method: method.to_string(),
            url: url.to_string(),
            headers,
            body,
            resource_type: resource_type.to_string(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn response(
        &self,
        url: &str,
        status: u16,
        status_text: &str,
        headers: BTreeMap<String, String>,
        content_type: Option<String>,
        body: Option<String>,
    ) {
        let _ = self.tx.send(TrafficEvent::Response {
            url: url.to_string(),
            status,
            status_text: status_text.to_string(),
            headers,
            content_type,
            body,
        });
    }
}

/// Observes the request/response streams for the lifetime of the run and
/// keeps the exchanges that match the API-traffic heuristic.
pub struct TrafficInterceptor {
    rx: mpsc::UnboundedReceiver<TrafficEvent>,
    exchanges: Vec<Exchange>,
    base_origin: String,
    body_prefix_cap: usize,
}

impl TrafficInterceptor {
    /// Create an interceptor and the tap the fetch layer reports through.
    /// The tap must be attached before any navigation happens.
    pub fn attach(base_url: &Url, body_prefix_cap: usize) -> (Self, TrafficTap) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut base_origin = base_url.to_string();
        if base_origin.ends_with('/') {
            base_origin.pop();
        }
        (
            Self {
                rx,
                exchanges: Vec::new(),
                base_origin,
                body_prefix_cap,
            },
            TrafficTap { tx },
        )
    }

    /// Process every queued event. Called between page visits and once at
    /// run end; ordering within each stream is capture order.
    pub fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: TrafficEvent) {
        match event {
            TrafficEvent::Request {
                method,
                url,
                headers,
                body,
                resource_type,
            } => {
                if !self.is_captured_request(&method, &url) {
                    trace!("skipping request {} {}", method, url);
                    return;
                }
                debug!("captured request {} {}", method, url);
                self.exchanges.push(Exchange {
                    method,
                    url,
                    headers,
                    body,
                    resource_type,
                    requested_at: Utc::now().to_rfc3339(),
                    response: None,
                });
            }
            TrafficEvent::Response {
                url,
                status,
                status_text,
                headers,
                content_type,
                body,
            } => {
                if !is_captured_response(&url, content_type.as_deref()) {
                    return;
                }
                // Decode failures are swallowed; the request half stays.
                let Some(body) = body else {
                    debug!("unreadable response body for {}", url);
                    return;
                };
                // Oldest unmatched exchange for the same URL wins. Purely
                // URL-keyed: concurrent duplicates can pair out of order.
                if let Some(exchange) = self
                    .exchanges
                    .iter_mut()
                    .find(|e| e.url == url && e.response.is_none())
                {
                    exchange.response = Some(ExchangeResponse {
                        status,
                        status_text,
                        headers,
                        body_prefix: truncate(&body, self.body_prefix_cap),
                        received_at: Utc::now().to_rfc3339(),
                    });
                }
            }
        }
    }

    fn is_captured_request(&self, method: &str, url: &str) -> bool {
        REQUEST_MARKERS.iter().any(|m| url.contains(m))
            || (method.eq_ignore_ascii_case("POST") && url.starts_with(&self.base_origin))
    }

    pub fn captured(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Flush remaining events and hand the exchanges to the aggregator.
    pub fn into_exchanges(mut self) -> Vec<Exchange> {
        self.drain();
        self.exchanges
    }
}

fn is_captured_response(url: &str, content_type: Option<&str>) -> bool {
    let textual = content_type
        .map(|ct| ct.contains("application/json") || ct.contains("text/"))
        .unwrap_or(false);
    textual && RESPONSE_MARKERS.iter().any(|m| url.contains(m))
}

fn truncate(s: &str, cap: usize) -> String {
    if s.len() <= cap {
        s.to_string()
    } else {
        s.chars().take(cap).collect()
    }
}
