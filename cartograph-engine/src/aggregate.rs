use crate::record::{ButtonRecord, FormRecord, LinkRecord, PageError, PageRecord};
use crate::session::Session;
use crate::traffic::Exchange;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// A form kept in the flat run-wide inventory, tagged with the page it
/// was found on. Duplicates across pages are expected and preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInventoryEntry {
    #[serde(flatten)]
    pub form: FormRecord,
    pub found_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonInventoryEntry {
    #[serde(flatten)]
    pub button: ButtonRecord,
    pub found_on: String,
}

/// Everything a run produced. Built incrementally by the aggregator and
/// finalized once at run end.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: String,
    pub session: Session,
    pub pages: Vec<PageRecord>,
    pub exchanges: Vec<Exchange>,
    pub errors: Vec<PageError>,
    pub fatal: Option<String>,
    /// Same-origin links, unique by href across the whole run.
    pub navigation: Vec<LinkRecord>,
    pub css_classes: BTreeSet<String>,
    pub forms: Vec<FormInventoryEntry>,
    pub buttons: Vec<ButtonInventoryEntry>,
    pub memory_warnings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub name: String,
    pub url: String,
    pub links: usize,
    pub buttons: usize,
    pub forms: usize,
}

/// Derived counts and signatures for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub run_id: String,
    pub generated_at: String,
    pub total_pages: usize,
    pub total_exchanges: usize,
    pub total_forms: usize,
    pub total_buttons: usize,
    pub total_navigation_links: usize,
    pub total_css_classes: usize,
    pub total_errors: usize,
    pub auth_success: bool,
    pub auth_attempts: u32,
    pub memory_warnings: usize,
    pub pages: Vec<PageSummary>,
    /// Distinct `METHOD /path` signatures in first-seen order.
    pub unique_endpoints: Vec<String>,
    pub fatal: Option<String>,
}

/// Merges page records, exchanges, the session, and errors into one
/// `RunResult` with the run-wide de-duplicated collections.
pub struct ResultAggregator {
    result: RunResult,
    base_prefix: String,
    seen_navigation: HashSet<String>,
}

impl ResultAggregator {
    pub fn new(base_url: &Url, run_id: String) -> Self {
        let mut base_prefix = base_url.to_string();
        if base_prefix.ends_with('/') {
            base_prefix.pop();
        }
        Self {
            result: RunResult {
                run_id,
                ..Default::default()
            },
            base_prefix,
            seen_navigation: HashSet::new(),
        }
    }

    pub fn record_session(&mut self, session: Session) {
        self.result.session = session;
    }

    /// Own a finished page record: fold its links, classes, forms, and
    /// buttons into the run-wide collections.
    pub fn absorb_page(&mut self, record: PageRecord) {
        for link in &record.links {
            if link.href.starts_with(&self.base_prefix)
                && self.seen_navigation.insert(link.href.clone())
            {
                self.result.navigation.push(link.clone());
            }
        }
        self.result
            .css_classes
            .extend(record.css_classes.iter().cloned());
        for form in &record.forms {
            self.result.forms.push(FormInventoryEntry {
                form: form.clone(),
                found_on: record.name.clone(),
            });
        }
        for button in &record.buttons {
            self.result.buttons.push(ButtonInventoryEntry {
                button: button.clone(),
                found_on: record.name.clone(),
            });
        }
        self.result.pages.push(record);
    }

    pub fn record_error(&mut self, error: PageError) {
        self.result.errors.push(error);
    }

    pub fn record_fatal(&mut self, message: String) {
        self.result.fatal = Some(message);
    }

    pub fn absorb_exchanges(&mut self, exchanges: Vec<Exchange>) {
        self.result.exchanges.extend(exchanges);
    }

    pub fn set_memory_warnings(&mut self, warnings: usize) {
        self.result.memory_warnings = warnings;
    }

    pub fn page_count(&self) -> usize {
        self.result.pages.len()
    }

    pub fn summarize(&self) -> Summary {
        let r = &self.result;
        let mut seen = HashSet::new();
        let mut unique_endpoints = Vec::new();
        for exchange in &r.exchanges {
            let path = Url::parse(&exchange.url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| exchange.url.clone());
            let signature = format!("{} {}", exchange.method, path);
            if seen.insert(signature.clone()) {
                unique_endpoints.push(signature);
            }
        }

        Summary {
            run_id: r.run_id.clone(),
            generated_at: Utc::now().to_rfc3339(),
            total_pages: r.pages.len(),
            total_exchanges: r.exchanges.len(),
            total_forms: r.forms.len(),
            total_buttons: r.buttons.len(),
            total_navigation_links: r.navigation.len(),
            total_css_classes: r.css_classes.len(),
            total_errors: r.errors.len(),
            auth_success: r.session.authenticated,
            auth_attempts: r.session.attempts,
            memory_warnings: r.memory_warnings,
            pages: r
                .pages
                .iter()
                .map(|p| PageSummary {
                    name: p.name.clone(),
                    url: p.url.clone(),
                    links: p.links.len(),
                    buttons: p.buttons.len(),
                    forms: p.forms.len(),
                })
                .collect(),
            unique_endpoints,
            fatal: r.fatal.clone(),
        }
    }

    pub fn finalize(self) -> RunResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MetaRecord;
    use std::collections::BTreeMap;

    fn page(name: &str, links: Vec<LinkRecord>) -> PageRecord {
        PageRecord {
            name: name.to_string(),
            url: format!("https://app.example.com/{}", name),
            dom_outline: None,
            links,
            buttons: vec![ButtonRecord {
                tag: "button".to_string(),
                button_type: "submit".to_string(),
                text: "Go".to_string(),
                id: String::new(),
                classes: vec![],
                disabled: false,
                aria_label: None,
            }],
            forms: vec![],
            inputs: vec![],
            css_classes: BTreeSet::from([name.to_string(), "shared".to_string()]),
            scripts: vec![],
            styles: vec![],
            meta: MetaRecord::default(),
            images: vec![],
            media: vec![],
            text_sample: String::new(),
            captured_at: String::new(),
        }
    }

    fn link(href: &str) -> LinkRecord {
        LinkRecord {
            href: href.to_string(),
            text: String::new(),
            target: String::new(),
            rel: String::new(),
        }
    }

    fn exchange(method: &str, url: &str) -> Exchange {
        Exchange {
            method: method.to_string(),
            url: url.to_string(),
            headers: BTreeMap::new(),
            body: None,
            resource_type: "xhr".to_string(),
            requested_at: String::new(),
            response: None,
        }
    }

    fn aggregator() -> ResultAggregator {
        let base = Url::parse("https://app.example.com").unwrap();
        ResultAggregator::new(&base, "run-1".to_string())
    }

    #[test]
    fn test_navigation_unique_across_pages() {
        let mut agg = aggregator();
        agg.absorb_page(page(
            "home",
            vec![
                link("https://app.example.com/fonts"),
                link("https://other.example.net/external"),
            ],
        ));
        agg.absorb_page(page("fonts", vec![link("https://app.example.com/fonts")]));

        let result = agg.finalize();
        assert_eq!(result.navigation.len(), 1, "same-origin unique by href");
        assert_eq!(result.navigation[0].href, "https://app.example.com/fonts");
    }

    #[test]
    fn test_button_inventory_keeps_duplicates_with_origin() {
        let mut agg = aggregator();
        agg.absorb_page(page("home", vec![]));
        agg.absorb_page(page("fonts", vec![]));

        let result = agg.finalize();
        assert_eq!(result.buttons.len(), 2);
        assert_eq!(result.buttons[0].found_on, "home");
        assert_eq!(result.buttons[1].found_on, "fonts");
    }

    #[test]
    fn test_css_classes_merge_into_ordered_set() {
        let mut agg = aggregator();
        agg.absorb_page(page("home", vec![]));
        agg.absorb_page(page("fonts", vec![]));
        let result = agg.finalize();
        assert_eq!(
            result.css_classes.iter().collect::<Vec<_>>(),
            vec!["fonts", "home", "shared"]
        );
    }

    #[test]
    fn test_unique_endpoint_signatures() {
        let mut agg = aggregator();
        agg.absorb_exchanges(vec![
            exchange("GET", "https://app.example.com/api/fonts?page=1"),
            exchange("GET", "https://app.example.com/api/fonts?page=2"),
            exchange("POST", "https://app.example.com/api/fonts"),
        ]);
        let summary = agg.summarize();
        assert_eq!(
            summary.unique_endpoints,
            vec!["GET /api/fonts", "POST /api/fonts"]
        );
        assert_eq!(summary.total_exchanges, 3);
    }

    #[test]
    fn test_summary_counts() {
        let mut agg = aggregator();
        let mut session = Session::default();
        session.authenticated = true;
        session.attempts = 2;
        agg.record_session(session);
        agg.absorb_page(page("home", vec![link("https://app.example.com/a")]));
        agg.record_error(PageError {
            page: "broken".to_string(),
            url: "https://app.example.com/broken".to_string(),
            error: "timeout".to_string(),
        });
        agg.set_memory_warnings(3);

        let summary = agg.summarize();
        assert_eq!(summary.total_pages, 1);
        assert_eq!(summary.total_errors, 1);
        assert!(summary.auth_success);
        assert_eq!(summary.auth_attempts, 2);
        assert_eq!(summary.memory_warnings, 3);
        assert_eq!(summary.pages[0].links, 1);
    }
}
