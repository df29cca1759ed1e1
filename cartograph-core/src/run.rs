use cartograph_engine::aggregate::{ResultAggregator, RunResult, Summary};
use cartograph_engine::artifact::ArtifactSink;
use cartograph_engine::auth::Authenticator;
use cartograph_engine::config::SurveyConfig;
use cartograph_engine::fetch::FetchSession;
use cartograph_engine::frontier::FrontierManager;
use cartograph_engine::guard::ResourceGuard;
use cartograph_engine::traffic::TrafficInterceptor;
use cartograph_engine::PageAnalyzer;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Callback for reporting survey progress
pub type SurveyProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a finished run hands back to the caller.
pub struct SurveyOutcome {
    pub result: RunResult,
    pub summary: Summary,
}

impl SurveyOutcome {
    pub fn is_fatal(&self) -> bool {
        self.result.fatal.is_some()
    }
}

/// Execute a full survey: authenticate, walk the frontier, capture
/// traffic, and aggregate everything into one outcome.
///
/// A failed login degrades the run to public pages only; the crawl
/// still happens and the session records what went wrong.
pub async fn execute_survey(
    config: SurveyConfig,
    sink: &dyn ArtifactSink,
    progress_callback: Option<SurveyProgressCallback>,
) -> SurveyOutcome {
    let report = |msg: String| {
        if let Some(cb) = &progress_callback {
            cb(msg);
        }
    };

    let run_id = Uuid::new_v4().to_string();
    info!("starting survey {} against {}", run_id, config.base_url);

    let (mut interceptor, tap) =
        TrafficInterceptor::attach(&config.base_url, config.limits.max_body_prefix);
    let mut aggregator = ResultAggregator::new(&config.base_url, run_id);
    let mut guard = ResourceGuard::new(config.memory_warn_percent);

    // A session that cannot even be built ends the run, but the outcome
    // is still assembled so the caller can persist what exists.
    let fetch = match FetchSession::new(tap, config.navigation_timeout, config.max_redirects) {
        Ok(fetch) => fetch,
        Err(e) => {
            aggregator.record_fatal(format!("building http session: {}", e));
            return finish(aggregator, interceptor, &guard);
        }
    };

    report("Authenticating...".to_string());
    let session = Authenticator::new(&fetch, &config).authenticate(sink).await;
    interceptor.drain();

    if config.credentials.is_some() && !session.authenticated {
        warn!("authentication failed, continuing with public pages only");
        report("Login failed, surveying public pages only".to_string());
    }
    aggregator.record_session(session);

    let mut frontier = FrontierManager::new(config.base_url.clone(), config.discovery_cap);
    frontier.seed(&config.seed_routes);

    let analyzer = PageAnalyzer::new(&fetch, &config.limits, config.navigation_timeout);

    while let Some(entry) = frontier.next() {
        guard.check();

        let label = if entry.seeded { "seed" } else { "discovered" };
        report(format!("Visiting {} ({})", entry.name, label));

        let url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(e) => {
                warn!("unparseable frontier url {}: {}", entry.url, e);
                continue;
            }
        };

        match analyzer.visit(&url, &entry.name, sink).await {
            Ok(record) => {
                frontier.discover(&record.links);
                aggregator.absorb_page(record);
            }
            Err(error) => {
                warn!("page {} failed: {}", error.page, error.error);
                aggregator.record_error(error);
            }
        }

        interceptor.drain();
        tokio::time::sleep(config.visit_delay).await;
    }

    info!(
        "survey complete: {} pages visited, {} links discovered",
        aggregator.page_count(),
        frontier.discovered_count()
    );
    report(format!("Visited {} pages", aggregator.page_count()));

    finish(aggregator, interceptor, &guard)
}

fn finish(
    mut aggregator: ResultAggregator,
    mut interceptor: TrafficInterceptor,
    guard: &ResourceGuard,
) -> SurveyOutcome {
    interceptor.drain();
    aggregator.absorb_exchanges(interceptor.into_exchanges());
    aggregator.set_memory_warnings(guard.warning_count());
    let summary = aggregator.summarize();
    SurveyOutcome {
        result: aggregator.finalize(),
        summary,
    }
}
