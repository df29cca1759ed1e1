use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single cookie harvested from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl CookieRecord {
    /// Parse a raw `Set-Cookie` header value. `request_host` supplies the
    /// domain when the header carries no Domain attribute.
    pub fn parse(header: &str, request_host: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let pair = parts.next()?.trim();
        let eq = pair.find('=')?;
        let name = pair[..eq].trim().to_string();
        let value = pair[eq + 1..].trim().to_string();
        if name.is_empty() {
            return None;
        }

        let mut domain = request_host.to_string();
        let mut path = "/".to_string();
        for attr in parts {
            let attr = attr.trim();
            if let Some(rest) = attr.split_once('=') {
                match rest.0.trim().to_ascii_lowercase().as_str() {
                    "domain" => domain = rest.1.trim().trim_start_matches('.').to_string(),
                    "path" => path = rest.1.trim().to_string(),
                    _ => {}
                }
            }
        }

        Some(Self {
            name,
            value,
            domain,
            path,
        })
    }
}

/// Field descriptor captured from the login form before it is filled,
/// kept for diagnostics when authentication misbehaves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginField {
    pub field_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub required: bool,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginButton {
    pub button_type: String,
    pub text: String,
    pub classes: Vec<String>,
}

/// Pre-fill snapshot of the login form structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginFormSnapshot {
    pub fields: Vec<LoginField>,
    pub buttons: Vec<LoginButton>,
}

/// Outcome of the authentication phase. Created when the authenticator
/// starts, mutated only by it, and frozen once the run ends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub authenticated: bool,
    pub attempts: u32,
    pub final_url: Option<String>,
    pub cookies: Vec<CookieRecord>,
    /// DOM storage snapshot. Only populated by engines that expose
    /// script-visible storage; the HTTP fetch engine leaves it empty.
    pub storage: BTreeMap<String, String>,
    pub login_form: Option<LoginFormSnapshot>,
    pub error: Option<String>,
}
