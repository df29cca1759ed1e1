use crate::dom::DomNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub href: String,
    pub text: String,
    pub target: String,
    pub rel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRecord {
    pub tag: String,
    pub button_type: String,
    pub text: String,
    pub id: String,
    pub classes: Vec<String>,
    pub disabled: bool,
    pub aria_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub tag: String,
    pub field_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub id: String,
    pub name: String,
    pub action: String,
    pub method: String,
    pub fields: Vec<FormField>,
}

/// An input/select/textarea element, whether or not it sits in a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub tag: String,
    pub field_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub required: bool,
    pub in_form: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    pub title: String,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_image: Option<String>,
    pub viewport: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub src: String,
    pub alt: String,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub tag: String,
    pub src: String,
    pub controls: bool,
    pub autoplay: bool,
}

/// Bounded structural snapshot of one visited page. Immutable after
/// creation; owned by the aggregator once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub name: String,
    pub url: String,
    pub dom_outline: Option<DomNode>,
    pub links: Vec<LinkRecord>,
    pub buttons: Vec<ButtonRecord>,
    pub forms: Vec<FormRecord>,
    pub inputs: Vec<InputRecord>,
    pub css_classes: BTreeSet<String>,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub meta: MetaRecord,
    pub images: Vec<ImageRecord>,
    pub media: Vec<MediaRecord>,
    pub text_sample: String,
    pub captured_at: String,
}

/// Per-page failure record. A failed page has no `PageRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageError {
    pub page: String,
    pub url: String,
    pub error: String,
}
