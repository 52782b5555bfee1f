use richfield_html::Element;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollapsibleData {
    #[serde(default)]
    pub is_open: bool,
}

impl CollapsibleData {
    pub(crate) fn export_element(&self) -> Element {
        let details = Element::new("details").with_attr("class", "rf-collapsible");
        if self.is_open {
            details.with_attr("open", "")
        } else {
            details
        }
    }
}

pub(crate) fn title_element() -> Element {
    Element::new("summary").with_attr("class", "rf-collapsible-title")
}

pub(crate) fn content_element() -> Element {
    Element::new("div").with_attr("class", "rf-collapsible-content")
}
