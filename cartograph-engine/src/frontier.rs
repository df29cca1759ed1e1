use crate::record::LinkRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};
use url::Url;

/// One queued visit. Seeded entries come from the curated route list;
/// discovered ones from link extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub name: String,
    pub url: String,
    pub seeded: bool,
}

/// Ordered set of URLs to visit: the seed list first, then discovered
/// links up to the cap. Keyed by normalized URL, each key is dequeued at
/// most once per run and never re-enqueued.
pub struct FrontierManager {
    base_url: Url,
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
    discovery_cap: usize,
    discovered: usize,
    dequeued: usize,
}

impl FrontierManager {
    pub fn new(base_url: Url, discovery_cap: usize) -> Self {
        Self {
            base_url,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            discovery_cap,
            discovered: 0,
            dequeued: 0,
        }
    }

    /// Enqueue the curated route list, in listed order.
    pub fn seed(&mut self, routes: &[String]) {
        for route in routes {
            let Ok(url) = self.base_url.join(route) else {
                debug!("skipping unjoinable seed route {}", route);
                continue;
            };
            let key = normalize(&url);
            if !self.seen.insert(key) {
                continue;
            }
            self.queue.push_back(FrontierEntry {
                name: page_name(&url),
                url: url.to_string(),
                seeded: true,
            });
        }
        debug!("seeded {} routes", self.queue.len());
    }

    /// Feed extracted links into the frontier. Returns how many were
    /// newly queued after origin, fragment, duplicate, and cap filtering.
    pub fn discover(&mut self, links: &[LinkRecord]) -> usize {
        let mut queued = 0;
        for link in links {
            if self.discovered >= self.discovery_cap {
                break;
            }
            let Ok(url) = Url::parse(&link.href) else {
                continue;
            };
            if url.fragment().is_some() {
                trace!("skipping fragment link {}", link.href);
                continue;
            }
            if !self.is_same_origin(&url) {
                trace!("skipping cross-origin link {}", link.href);
                continue;
            }
            let key = normalize(&url);
            if !self.seen.insert(key) {
                continue;
            }
            self.queue.push_back(FrontierEntry {
                name: page_name(&url),
                url: url.to_string(),
                seeded: false,
            });
            self.discovered += 1;
            queued += 1;
        }
        if queued > 0 {
            debug!("queued {} discovered links", queued);
        }
        queued
    }

    /// Dequeue the next URL to visit, or `None` when the frontier is
    /// exhausted.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.dequeued += 1;
        Some(entry)
    }

    pub fn dequeued_count(&self) -> usize {
        self.dequeued
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.base_url.scheme()
            && url.host_str() == self.base_url.host_str()
            && url.port_or_known_default() == self.base_url.port_or_known_default()
    }
}

/// Frontier key: scheme + host + path, fragment and query stripped.
fn normalize(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.path()
    )
}

/// Deterministic page name from the URL path: separators become dashes,
/// the leading one is stripped, and an empty path falls back.
pub fn page_name(url: &Url) -> String {
    let name = url
        .path()
        .replace('/', "-")
        .trim_start_matches('-')
        .to_string();
    if name.is_empty() {
        "discovered".to_string()
    } else {
        name
    }
}
