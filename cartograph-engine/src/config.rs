use std::time::Duration;
use url::Url;

/// Login credentials for the target application. Always injected by the
/// caller; the engine never stores defaults.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Hard bounds applied to every page extraction. Shared by all pages so
/// each `PageRecord` is bounded in size regardless of page complexity.
#[derive(Debug, Clone)]
pub struct ExtractionLimits {
    /// Maximum DOM outline depth below `<body>`.
    pub max_depth: usize,
    /// Maximum children visited per outline node.
    pub max_children: usize,
    /// Per-item text truncation (link text, button labels).
    pub max_text_len: usize,
    /// Maximum images recorded per page.
    pub max_images: usize,
    /// Page body text sample cap.
    pub max_text_sample: usize,
    /// Captured response body prefix cap.
    pub max_body_prefix: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_children: 20,
            max_text_len: 200,
            max_images: 50,
            max_text_sample: 10_000,
            max_body_prefix: 50_000,
        }
    }
}

/// Static configuration for a survey run. All fields are inputs to the
/// engine and never mutated by it.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub base_url: Url,
    pub credentials: Option<Credentials>,
    /// Path of the login route under `base_url`.
    pub login_path: String,
    /// URL fragments treated as evidence that authentication succeeded.
    pub success_patterns: Vec<String>,
    /// Curated application routes visited before any discovered link.
    pub seed_routes: Vec<String>,
    pub max_login_attempts: u32,
    /// Per-navigation (and per-login-attempt) timeout.
    pub navigation_timeout: Duration,
    /// Pause between login attempts.
    pub retry_delay: Duration,
    /// Settle pause after a login submission before reading the outcome URL.
    pub settle_delay: Duration,
    /// Fixed pacing delay inserted after every page visit.
    pub visit_delay: Duration,
    /// Maximum pages queued from link discovery, beyond the seed list.
    pub discovery_cap: usize,
    /// Memory usage percentage above which the guard warns.
    pub memory_warn_percent: f64,
    /// Redirect hops followed per navigation.
    pub max_redirects: usize,
    pub limits: ExtractionLimits,
}

impl SurveyConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            credentials: None,
            login_path: "/login".to_string(),
            success_patterns: vec![
                "/home".to_string(),
                "/dashboard".to_string(),
                "/studio".to_string(),
                "/selectPlan".to_string(),
                "/sso".to_string(),
                "route=".to_string(),
            ],
            seed_routes: vec![
                "/home".to_string(),
                "/dashboard".to_string(),
                "/studio".to_string(),
                "/fonts".to_string(),
                "/mypage".to_string(),
                "/settings".to_string(),
                "/pricing".to_string(),
                "/selectPlan".to_string(),
                "/terms".to_string(),
                "/privacy".to_string(),
                "/help".to_string(),
                "/contact".to_string(),
                "/resetPassword".to_string(),
                "/sso".to_string(),
            ],
            max_login_attempts: 3,
            navigation_timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(2),
            settle_delay: Duration::from_millis(500),
            visit_delay: Duration::from_millis(1500),
            discovery_cap: 50,
            memory_warn_percent: 65.0,
            max_redirects: 5,
            limits: ExtractionLimits::default(),
        }
    }

    pub fn with_credentials(mut self, email: String, password: String) -> Self {
        self.credentials = Some(Credentials { email, password });
        self
    }

    pub fn with_seed_routes(mut self, routes: Vec<String>) -> Self {
        self.seed_routes = routes;
        self
    }

    pub fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_visit_delay(mut self, delay: Duration) -> Self {
        self.visit_delay = delay;
        self
    }

    pub fn with_discovery_cap(mut self, cap: usize) -> Self {
        self.discovery_cap = cap;
        self
    }

    pub fn with_memory_warn_percent(mut self, percent: f64) -> Self {
        self.memory_warn_percent = percent;
        self
    }

    /// Absolute URL of the login route.
    pub fn login_url(&self) -> Url {
        self.base_url
            .join(&self.login_path)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}
