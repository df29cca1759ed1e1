pub mod aggregate;
pub mod analyzer;
pub mod artifact;
pub mod auth;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod guard;
pub mod record;
pub mod session;
pub mod traffic;

pub use aggregate::{ResultAggregator, RunResult, Summary};
pub use analyzer::PageAnalyzer;
pub use artifact::{ArtifactSink, NullSink};
pub use auth::Authenticator;
pub use config::{Credentials, ExtractionLimits, SurveyConfig};
pub use error::{EngineError, Result};
pub use fetch::FetchSession;
pub use frontier::FrontierManager;
pub use guard::ResourceGuard;
pub use record::{PageError, PageRecord};
pub use session::Session;
pub use traffic::{Exchange, TrafficInterceptor, TrafficTap};
