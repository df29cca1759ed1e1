use crate::artifact::ArtifactSink;
use crate::config::{Credentials, SurveyConfig};
use crate::error::{EngineError, Result};
use crate::fetch::{FetchSession, FetchedPage};
use crate::session::{CookieRecord, LoginButton, LoginField, LoginFormSnapshot, Session};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Login state machine position. `Failed` re-enters `Init` while
/// attempts remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Init,
    FormLoaded,
    Submitted,
    AwaitingOutcome,
    Success,
    Failed,
}

struct AttemptOutcome {
    success: bool,
    final_url: String,
    cookies: Vec<CookieRecord>,
    body: String,
}

struct LoginPlan {
    snapshot: LoginFormSnapshot,
    action: Url,
    email_field: String,
    password_field: String,
    hidden_fields: Vec<(String, String)>,
}

/// Drives the login form against the session, retrying on failure up to
/// the attempt budget. Every error during an attempt is treated as
/// retryable; exhaustion surfaces as `authenticated == false` and the
/// run continues against public pages only.
pub struct Authenticator<'a> {
    fetch: &'a FetchSession,
    config: &'a SurveyConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(fetch: &'a FetchSession, config: &'a SurveyConfig) -> Self {
        Self { fetch, config }
    }

    pub async fn authenticate(&self, sink: &dyn ArtifactSink) -> Session {
        let mut session = Session::default();
        let Some(credentials) = &self.config.credentials else {
            info!("no credentials supplied, surveying public pages only");
            session.error = Some("no credentials supplied".to_string());
            return session;
        };

        let max_attempts = self.config.max_login_attempts.max(1);
        for attempt in 1..=max_attempts {
            session.attempts = attempt;
            info!("login attempt {}/{}", attempt, max_attempts);

            let bounded = tokio::time::timeout(
                self.config.navigation_timeout,
                self.attempt(credentials, &mut session, sink),
            );
            match bounded.await {
                Ok(Ok(outcome)) if outcome.success => {
                    if outcome.cookies.is_empty() {
                        warn!("authenticated but no session cookie was set");
                    }
                    if let Err(e) = sink.write_html("after-login", &outcome.body) {
                        warn!("could not persist post-auth snapshot: {}", e);
                    }
                    info!("login succeeded, landed on {}", outcome.final_url);
                    session.authenticated = true;
                    session.final_url = Some(outcome.final_url);
                    session.cookies = outcome.cookies;
                    session.error = None;
                    return session;
                }
                Ok(Ok(outcome)) => {
                    warn!("login rejected, still on {}", outcome.final_url);
                    session.error = Some(format!("login rejected at {}", outcome.final_url));
                }
                Ok(Err(e)) => {
                    warn!("login attempt error: {}", e);
                    session.error = Some(e.to_string());
                }
                Err(_) => {
                    let e = EngineError::NavigationTimeout(
                        self.config.navigation_timeout.as_millis() as u64,
                    );
                    warn!("login attempt timed out");
                    session.error = Some(e.to_string());
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        warn!("login failed after {} attempts", max_attempts);
        session.authenticated = false;
        session
    }

    async fn attempt(
        &self,
        credentials: &Credentials,
        session: &mut Session,
        sink: &dyn ArtifactSink,
    ) -> Result<AttemptOutcome> {
        let mut state = AuthState::Init;
        debug!("auth state {:?}", state);

        let login_url = self.config.login_url();
        let page = self.fetch.navigate(&login_url).await?;
        let mut cookies = page.cookies.clone();
        if let Err(e) = sink.write_html("login-page", &page.body) {
            warn!("could not persist login page snapshot: {}", e);
        }

        let plan = parse_login_form(&page)?;
        session.login_form = Some(plan.snapshot.clone());
        state = AuthState::FormLoaded;
        debug!("auth state {:?}, form action {}", state, plan.action);

        let mut fields = plan.hidden_fields.clone();
        fields.push((plan.email_field.clone(), credentials.email.clone()));
        fields.push((plan.password_field.clone(), credentials.password.clone()));
        let submitted = self.fetch.submit_form(&plan.action, &fields).await?;
        state = AuthState::Submitted;
        debug!("auth state {:?}", state);
        cookies.extend(submitted.cookies.clone());

        state = AuthState::AwaitingOutcome;
        debug!("auth state {:?}, settling", state);
        tokio::time::sleep(self.config.settle_delay).await;

        let success = self.is_success_url(&submitted.url);
        state = if success {
            AuthState::Success
        } else {
            AuthState::Failed
        };
        debug!("auth state {:?}, outcome url {}", state, submitted.url);

        Ok(AttemptOutcome {
            success,
            final_url: submitted.url,
            cookies,
            body: submitted.body,
        })
    }

    /// Success means the settled URL left the login route, or matches one
    /// of the configured post-login patterns (a plan-selection page counts
    /// as success even though no dashboard was reached).
    fn is_success_url(&self, url: &str) -> bool {
        !url.contains(&self.config.login_path)
            || self.config.success_patterns.iter().any(|p| url.contains(p))
    }
}

fn field_descriptor(element: ElementRef) -> LoginField {
    let value = element.value();
    LoginField {
        field_type: value.attr("type").unwrap_or(value.name()).to_string(),
        name: value.attr("name").unwrap_or("").to_string(),
        id: value.attr("id").unwrap_or("").to_string(),
        placeholder: value.attr("placeholder").unwrap_or("").to_string(),
        required: value.attr("required").is_some(),
        pattern: value.attr("pattern").map(|s| s.to_string()),
    }
}

fn parse_login_form(page: &FetchedPage) -> Result<LoginPlan> {
    let document = Html::parse_document(&page.body);
    let page_url = Url::parse(&page.url)
        .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", page.url, e)))?;

    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input").unwrap();
    let button_selector = Selector::parse("button").unwrap();
    let password_selector = Selector::parse("input[type=\"password\"]").unwrap();

    // Prefer the form that actually carries a password field; fall back
    // to the first form, then to the whole document.
    let form = document
        .select(&form_selector)
        .find(|f| f.select(&password_selector).next().is_some())
        .or_else(|| document.select(&form_selector).next());

    let inputs: Vec<ElementRef> = match form {
        Some(f) => f.select(&input_selector).collect(),
        None => document.select(&input_selector).collect(),
    };
    let buttons: Vec<ElementRef> = match form {
        Some(f) => f.select(&button_selector).collect(),
        None => document.select(&button_selector).collect(),
    };

    let snapshot = LoginFormSnapshot {
        fields: inputs.iter().map(|i| field_descriptor(*i)).collect(),
        buttons: buttons
            .iter()
            .map(|b| LoginButton {
                button_type: b.value().attr("type").unwrap_or("").to_string(),
                text: b.text().collect::<Vec<_>>().join(" ").trim().to_string(),
                classes: b.value().classes().map(|c| c.to_string()).collect(),
            })
            .collect(),
    };

    let password_field = inputs
        .iter()
        .find(|i| i.value().attr("type") == Some("password"))
        .ok_or_else(|| {
            EngineError::LoginForm(format!("no password field on {}", page.url))
        })?
        .value()
        .attr("name")
        .unwrap_or("password")
        .to_string();

    let email_field = inputs
        .iter()
        .find(|i| {
            i.value().attr("name") == Some("email") || i.value().attr("type") == Some("email")
        })
        .and_then(|i| i.value().attr("name"))
        .unwrap_or("email")
        .to_string();

    let hidden_fields = inputs
        .iter()
        .filter(|i| i.value().attr("type") == Some("hidden"))
        .filter_map(|i| {
            i.value()
                .attr("name")
                .map(|n| (n.to_string(), i.value().attr("value").unwrap_or("").to_string()))
        })
        .collect();

    let action = form
        .and_then(|f| f.value().attr("action"))
        .filter(|a| !a.is_empty())
        .and_then(|a| page_url.join(a).ok())
        .unwrap_or_else(|| page_url.clone());

    Ok(LoginPlan {
        snapshot,
        action,
        email_field,
        password_field,
        hidden_fields,
    })
}
