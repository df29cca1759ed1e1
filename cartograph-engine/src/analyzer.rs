use crate::artifact::{ArtifactSink, safe_name};
use crate::config::ExtractionLimits;
use crate::dom::body_outline;
use crate::error::EngineError;
use crate::fetch::{FetchSession, FetchedPage};
use crate::record::{
    ButtonRecord, FormField, FormRecord, ImageRecord, InputRecord, LinkRecord, MediaRecord,
    MetaRecord, PageError, PageRecord, SelectOption,
};
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Fetches one page and extracts its bounded structural record.
///
/// `visit` never fails the run: every failure becomes a per-page error
/// and the crawl moves on.
pub struct PageAnalyzer<'a> {
    fetch: &'a FetchSession,
    limits: &'a ExtractionLimits,
    timeout: Duration,
}

impl<'a> PageAnalyzer<'a> {
    pub fn new(fetch: &'a FetchSession, limits: &'a ExtractionLimits, timeout: Duration) -> Self {
        Self {
            fetch,
            limits,
            timeout,
        }
    }

    pub async fn visit(
        &self,
        url: &Url,
        name: &str,
        sink: &dyn ArtifactSink,
    ) -> Result<PageRecord, PageError> {
        debug!("visiting {} ({})", name, url);

        let page_error = |error: String| PageError {
            page: name.to_string(),
            url: url.to_string(),
            error,
        };

        let page = match tokio::time::timeout(self.timeout, self.fetch.navigate(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return Err(page_error(e.to_string())),
            Err(_) => {
                let e = EngineError::NavigationTimeout(self.timeout.as_millis() as u64);
                return Err(page_error(e.to_string()));
            }
        };

        let record = extract_record(&page, name, self.limits);

        let file_name = safe_name(name);
        sink.write_html(&file_name, &page.body)
            .map_err(|e| page_error(format!("persisting html: {}", e)))?;
        sink.write_screenshot(&file_name, None)
            .map_err(|e| page_error(format!("persisting screenshot: {}", e)))?;

        info!(
            "analyzed {}: links={}, buttons={}, forms={}",
            name,
            record.links.len(),
            record.buttons.len(),
            record.forms.len()
        );
        Ok(record)
    }
}

fn extract_record(page: &FetchedPage, name: &str, limits: &ExtractionLimits) -> PageRecord {
    let document = Html::parse_document(&page.body);
    let base = Url::parse(&page.url).ok();

    PageRecord {
        name: name.to_string(),
        url: page.url.clone(),
        dom_outline: body_outline(&document, limits),
        links: extract_links(&document, base.as_ref(), limits),
        buttons: extract_buttons(&document, limits),
        forms: extract_forms(&document, base.as_ref()),
        inputs: extract_inputs(&document),
        css_classes: extract_css_classes(&document),
        scripts: extract_resource_urls(&document, base.as_ref(), "script[src]", "src"),
        styles: extract_resource_urls(&document, base.as_ref(), "link[rel=\"stylesheet\"]", "href"),
        meta: extract_meta(&document),
        images: extract_images(&document, base.as_ref(), limits),
        media: extract_media(&document, base.as_ref()),
        text_sample: extract_text_sample(&document, limits),
        captured_at: Utc::now().to_rfc3339(),
    }
}

fn resolve(base: Option<&Url>, raw: &str) -> Option<String> {
    if raw.is_empty()
        || raw.starts_with("javascript:")
        || raw.starts_with("mailto:")
        || raw.starts_with("tel:")
    {
        return None;
    }
    match base {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => Some(raw.to_string()),
    }
}

fn element_text(element: ElementRef, cap: usize) -> String {
    let text = element.text().collect::<Vec<_>>().join(" ");
    truncate_chars(text.split_whitespace().collect::<Vec<_>>().join(" ").trim(), cap)
}

fn truncate_chars(s: &str, cap: usize) -> String {
    s.chars().take(cap).collect()
}

fn extract_links(document: &Html, base: Option<&Url>, limits: &ExtractionLimits) -> Vec<LinkRecord> {
    let selector = Selector::parse("a[href]").unwrap();
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(raw) = element.value().attr("href") else {
            continue;
        };
        let Some(href) = resolve(base, raw) else {
            continue;
        };
        if !seen.insert(href.clone()) {
            continue;
        }
        links.push(LinkRecord {
            href,
            text: element_text(element, limits.max_text_len),
            target: element.value().attr("target").unwrap_or("").to_string(),
            rel: element.value().attr("rel").unwrap_or("").to_string(),
        });
    }
    links
}

fn extract_buttons(document: &Html, limits: &ExtractionLimits) -> Vec<ButtonRecord> {
    let selector =
        Selector::parse("button, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"]")
            .unwrap();
    document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            let tag = value.name().to_string();
            let text = if tag == "input" {
                truncate_chars(value.attr("value").unwrap_or(""), limits.max_text_len)
            } else {
                element_text(element, limits.max_text_len)
            };
            ButtonRecord {
                tag,
                button_type: value.attr("type").unwrap_or("").to_string(),
                text,
                id: value.attr("id").unwrap_or("").to_string(),
                classes: value.classes().map(|c| c.to_string()).collect(),
                disabled: value.attr("disabled").is_some(),
                aria_label: value.attr("aria-label").map(|s| s.to_string()),
            }
        })
        .collect()
}

fn form_field(element: ElementRef) -> FormField {
    let value = element.value();
    let tag = value.name().to_string();
    let options = if tag == "select" {
        let option_selector = Selector::parse("option").unwrap();
        Some(
            element
                .select(&option_selector)
                .map(|o| SelectOption {
                    value: o.value().attr("value").unwrap_or("").to_string(),
                    text: element_text(o, 200),
                })
                .collect(),
        )
    } else {
        None
    };
    FormField {
        field_type: value.attr("type").unwrap_or(&tag).to_string(),
        tag,
        name: value.attr("name").unwrap_or("").to_string(),
        id: value.attr("id").unwrap_or("").to_string(),
        placeholder: value.attr("placeholder").unwrap_or("").to_string(),
        required: value.attr("required").is_some(),
        pattern: value.attr("pattern").map(|s| s.to_string()),
        min_length: value.attr("minlength").map(|s| s.to_string()),
        max_length: value.attr("maxlength").map(|s| s.to_string()),
        options,
    }
}

fn extract_forms(document: &Html, base: Option<&Url>) -> Vec<FormRecord> {
    let form_selector = Selector::parse("form").unwrap();
    let field_selector = Selector::parse("input, select, textarea").unwrap();
    document
        .select(&form_selector)
        .map(|form| {
            let value = form.value();
            let action = value
                .attr("action")
                .and_then(|a| resolve(base, a))
                .or_else(|| base.map(|b| b.to_string()))
                .unwrap_or_default();
            FormRecord {
                id: value.attr("id").unwrap_or("").to_string(),
                name: value.attr("name").unwrap_or("").to_string(),
                action,
                method: value.attr("method").unwrap_or("get").to_lowercase(),
                fields: form.select(&field_selector).map(form_field).collect(),
            }
        })
        .collect()
}

fn extract_inputs(document: &Html) -> Vec<InputRecord> {
    let selector = Selector::parse("input, select, textarea").unwrap();
    document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            let tag = value.name().to_string();
            let in_form = element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "form");
            InputRecord {
                field_type: value.attr("type").unwrap_or(&tag).to_string(),
                tag,
                name: value.attr("name").unwrap_or("").to_string(),
                id: value.attr("id").unwrap_or("").to_string(),
                placeholder: value.attr("placeholder").unwrap_or("").to_string(),
                required: value.attr("required").is_some(),
                in_form,
            }
        })
        .collect()
}

fn extract_css_classes(document: &Html) -> BTreeSet<String> {
    let selector = Selector::parse("*").unwrap();
    document
        .select(&selector)
        .flat_map(|element| element.value().classes().map(|c| c.to_string()))
        .collect()
}

fn extract_resource_urls(
    document: &Html,
    base: Option<&Url>,
    selector: &str,
    attr: &str,
) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|raw| resolve(base, raw))
        .collect()
}

fn extract_meta(document: &Html) -> MetaRecord {
    let meta_content = |query: &str| -> Option<String> {
        let selector = Selector::parse(query).unwrap();
        document
            .select(&selector)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(|s| s.to_string())
    };
    let title_selector = Selector::parse("title").unwrap();
    MetaRecord {
        title: document
            .select(&title_selector)
            .next()
            .map(|t| element_text(t, 500))
            .unwrap_or_default(),
        description: meta_content("meta[name=\"description\"]"),
        og_title: meta_content("meta[property=\"og:title\"]"),
        og_image: meta_content("meta[property=\"og:image\"]"),
        viewport: meta_content("meta[name=\"viewport\"]"),
    }
}

fn extract_images(document: &Html, base: Option<&Url>, limits: &ExtractionLimits) -> Vec<ImageRecord> {
    let selector = Selector::parse("img").unwrap();
    document
        .select(&selector)
        .take(limits.max_images)
        .map(|element| {
            let value = element.value();
            ImageRecord {
                src: value
                    .attr("src")
                    .and_then(|s| resolve(base, s))
                    .unwrap_or_default(),
                alt: value.attr("alt").unwrap_or("").to_string(),
                width: value.attr("width").map(|s| s.to_string()),
                height: value.attr("height").map(|s| s.to_string()),
            }
        })
        .collect()
}

fn extract_media(document: &Html, base: Option<&Url>) -> Vec<MediaRecord> {
    let selector = Selector::parse("video, audio").unwrap();
    document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            MediaRecord {
                tag: value.name().to_string(),
                src: value
                    .attr("src")
                    .and_then(|s| resolve(base, s))
                    .unwrap_or_default(),
                controls: value.attr("controls").is_some(),
                autoplay: value.attr("autoplay").is_some(),
            }
        })
        .collect()
}

fn extract_text_sample(document: &Html, limits: &ExtractionLimits) -> String {
    let selector = Selector::parse("body").unwrap();
    document
        .select(&selector)
        .next()
        .map(|body| element_text(body, limits.max_text_sample))
        .unwrap_or_default()
}
