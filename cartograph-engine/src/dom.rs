use crate::config::ExtractionLimits;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node of the bounded DOM outline. Children are ordered and capped
/// in both depth and breadth; attributes are filtered to the
/// `data-`/`aria-`/`role` subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<DomNode>,
}

impl DomNode {
    /// Depth of the outline in edges below this node.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Build the bounded outline of the document body, or `None` when the
/// document has no body element.
pub fn body_outline(document: &Html, limits: &ExtractionLimits) -> Option<DomNode> {
    let body_selector = Selector::parse("body").unwrap();
    let body = document.select(&body_selector).next()?;
    Some(outline(body, 0, limits))
}

fn outline(element: ElementRef, depth: usize, limits: &ExtractionLimits) -> DomNode {
    let value = element.value();

    let attributes = value
        .attrs()
        .filter(|(name, _)| {
            name.starts_with("data-") || name.starts_with("aria-") || *name == "role"
        })
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    let children = if depth < limits.max_depth {
        element
            .children()
            .filter_map(ElementRef::wrap)
            .take(limits.max_children)
            .map(|child| outline(child, depth + 1, limits))
            .collect()
    } else {
        Vec::new()
    };

    DomNode {
        tag: value.name().to_string(),
        id: value.attr("id").map(|s| s.to_string()),
        classes: value.classes().map(|c| c.to_string()).collect(),
        attributes,
        children,
    }
}
