//! Detection of requests originating from the editing side panel.
//!
//! The panel script annotates its requests with a `wrapper_format` query
//! parameter. Plain form submissions inside the panel also carry it, but
//! their triggering element is the submit button (`op`), which must not be
//! treated as an in-panel AJAX interaction.

use std::collections::HashMap;

pub const WRAPPER_FORMAT_PARAM: &str = "wrapper_format";
pub const TRIGGERING_ELEMENT_PARAM: &str = "triggering_element";

/// `wrapper_format` value for requests rendered inside the side panel.
pub const PANEL_FORMAT: &str = "stanza_panel";

/// `wrapper_format` value for AJAX requests issued by the panel script.
pub const AJAX_FORMAT: &str = "stanza_ajax";

/// Whether the request was issued from inside the side panel.
pub fn is_panel_request(query: &HashMap<String, String>) -> bool {
    match query.get(WRAPPER_FORMAT_PARAM).map(String::as_str) {
        Some(PANEL_FORMAT) => true,
        Some(AJAX_FORMAT) => {
            query.get(TRIGGERING_ELEMENT_PARAM).map(String::as_str) != Some("op")
        }
        _ => false,
    }
}

/// Whether the request expects a [`crate::commands::CommandBatch`] response
/// instead of a redirect.
pub fn is_ajax_request(query: &HashMap<String, String>) -> bool {
    query.get(WRAPPER_FORMAT_PARAM).map(String::as_str) == Some(AJAX_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn panel_format_is_a_panel_request() {
        assert!(is_panel_request(&query(&[("wrapper_format", "stanza_panel")])));
    }

    #[test]
    fn ajax_format_counts_unless_triggered_by_submit() {
        assert!(is_panel_request(&query(&[("wrapper_format", "stanza_ajax")])));
        assert!(is_panel_request(&query(&[
            ("wrapper_format", "stanza_ajax"),
            ("triggering_element", "field_content_add_more"),
        ])));
        assert!(!is_panel_request(&query(&[
            ("wrapper_format", "stanza_ajax"),
            ("triggering_element", "op"),
        ])));
    }

    #[test]
    fn plain_requests_are_not_panel_requests() {
        assert!(!is_panel_request(&query(&[])));
        assert!(!is_panel_request(&query(&[("wrapper_format", "html")])));
        assert!(!is_ajax_request(&query(&[])));
    }
}
