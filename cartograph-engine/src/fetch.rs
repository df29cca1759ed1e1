use crate::error::{EngineError, Result};
use crate::session::CookieRecord;
use crate::traffic::TrafficTap;
use reqwest::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = "Cartograph/0.2 (https://github.com/trapdoorsec/cartograph)";

/// A settled navigation: the terminal hop after redirects, plus every
/// cookie set along the way.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    /// Cookies harvested from all redirect hops, in arrival order.
    pub cookies: Vec<CookieRecord>,
}

/// The browser-primitive stand-in: navigation and form submission over
/// plain HTTP. Redirects are followed manually so every hop can be
/// reported to the traffic tap and its `Set-Cookie` headers harvested.
/// Acquired once per run; dropping it releases the connection pool.
pub struct FetchSession {
    client: Client,
    tap: TrafficTap,
    max_redirects: usize,
}

impl FetchSession {
    pub fn new(tap: TrafficTap, timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            tap,
            max_redirects,
        })
    }

    /// GET a URL, following redirects up to the hop limit.
    pub async fn navigate(&self, url: &Url) -> Result<FetchedPage> {
        self.perform(Method::GET, url.clone(), None).await
    }

    /// POST a form and follow the resulting redirect chain.
    pub async fn submit_form(&self, action: &Url, fields: &[(String, String)]) -> Result<FetchedPage> {
        self.perform(Method::POST, action.clone(), Some(fields)).await
    }

    async fn perform(
        &self,
        method: Method,
        url: Url,
        form: Option<&[(String, String)]>,
    ) -> Result<FetchedPage> {
        let start_url = url.to_string();
        let mut current = url;
        let mut method = method;
        let mut form = form;
        let mut cookies = Vec::new();

        for _hop in 0..=self.max_redirects {
            let mut request_headers = BTreeMap::new();
            request_headers.insert("user-agent".to_string(), USER_AGENT.to_string());

            let mut builder = self.client.request(method.clone(), current.clone());
            let mut body_repr = None;
            if let Some(fields) = form {
                builder = builder.form(&fields);
                request_headers.insert(
                    "content-type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                );
                body_repr = Some(encode_form(fields));
            }

            self.tap.request(
                method.as_str(),
                current.as_str(),
                request_headers,
                body_repr,
                "document",
            );

            debug!("{} {}", method, current);
            let response = builder.send().await?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or("").to_string();
            let response_headers = header_map(response.headers());
            let host = current.host_str().unwrap_or("").to_string();
            for raw in response.headers().get_all(SET_COOKIE) {
                if let Ok(value) = raw.to_str()
                    && let Some(cookie) = CookieRecord::parse(value, &host)
                {
                    cookies.push(cookie);
                }
            }
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let is_redirect = status.is_redirection() && location.is_some();

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("unreadable response body for {}: {}", current, e);
                    self.tap.response(
                        current.as_str(),
                        status.as_u16(),
                        &status_text,
                        response_headers,
                        content_type,
                        None,
                    );
                    return Err(e.into());
                }
            };
            self.tap.response(
                current.as_str(),
                status.as_u16(),
                &status_text,
                response_headers,
                content_type.clone(),
                Some(body.clone()),
            );

            if is_redirect {
                let target = location.unwrap_or_default();
                let next = current
                    .join(&target)
                    .map_err(|e| EngineError::InvalidUrl(format!("{}: {}", target, e)))?;
                // 307/308 preserve the method and body; everything else
                // is refetched as GET.
                if !matches!(status.as_u16(), 307 | 308) {
                    method = Method::GET;
                    form = None;
                }
                debug!("redirect {} -> {}", current, next);
                current = next;
                continue;
            }

            return Ok(FetchedPage {
                url: current.to_string(),
                status: status.as_u16(),
                content_type,
                body,
                cookies,
            });
        }

        Err(EngineError::TooManyRedirects(start_url))
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect()
}

fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::TrafficInterceptor;
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(base: &Url) -> (FetchSession, TrafficInterceptor) {
        let (interceptor, tap) = TrafficInterceptor::attach(base, 50_000);
        let fetch = FetchSession::new(tap, Duration::from_secs(5), 5).unwrap();
        (fetch, interceptor)
    }

    #[tokio::test]
    async fn test_navigate_follows_redirects_and_collects_cookies() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/start"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/end")
                    .insert_header("set-cookie", "hop=1; Path=/"),
            )
            .mount(&server)
            .await;
        Mock::given(http_method("GET"))
            .and(path("/end"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .insert_header("set-cookie", "hop=2; Path=/")
                    .set_body_string("<html><body>done</body></html>"),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let (fetch, _interceptor) = session_for(&base);
        let page = fetch.navigate(&base.join("/start").unwrap()).await.unwrap();

        assert_eq!(page.status, 200);
        assert!(page.url.ends_with("/end"));
        let names: Vec<&str> = page.cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["hop", "hop"]);
        assert_eq!(page.cookies[0].value, "1");
        assert_eq!(page.cookies[1].value, "2");
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let (fetch, _interceptor) = session_for(&base);
        let err = fetch.navigate(&base.join("/loop").unwrap()).await.unwrap_err();
        assert!(matches!(err, EngineError::TooManyRedirects(_)));
    }

    #[tokio::test]
    async fn test_form_post_reported_to_tap() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let (fetch, mut interceptor) = session_for(&base);
        let fields = vec![
            ("email".to_string(), "a@b.c".to_string()),
            ("password".to_string(), "hunter2".to_string()),
        ];
        fetch
            .submit_form(&base.join("/login").unwrap(), &fields)
            .await
            .unwrap();

        interceptor.drain();
        let captured = interceptor.captured();
        assert_eq!(captured.len(), 1, "POST to target origin is captured");
        assert_eq!(captured[0].method, "POST");
        assert_eq!(
            captured[0].body.as_deref(),
            Some("email=a%40b.c&password=hunter2")
        );
    }
}
