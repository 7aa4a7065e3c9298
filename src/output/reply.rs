//! Reply rendering for query outcomes

use crate::resolver::QueryOutcome;

/// Label of the button attached to a match
pub const DOWNLOAD_LABEL: &str = "ᴅᴏᴡɴʟᴏᴀᴅ";

pub const NO_MATCH_TEXT: &str = "No matching channels found.";

pub const TEMPORARY_ISSUE_TEXT: &str = "An error occurred while processing your request.";

/// Inline URL button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// Message sent back to the requester
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTML-formatted text
    pub text: String,
    pub button: Option<Button>,
}

impl Reply {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            button: None,
        }
    }
}

/// Rewrites deep links through the public website
///
/// Only links carrying a `start=` payload are rewritten; with no website
/// configured the link is returned unchanged.
pub fn web_link(link: &str, website_url: Option<&str>) -> String {
    match (website_url, link.rsplit_once("start=")) {
        (Some(site), Some((_, payload))) => format!("{}?link={}", site, payload),
        _ => link.to_string(),
    }
}

/// Renders the reply for an outcome, or `None` when nothing should be sent
pub fn render_reply(outcome: &QueryOutcome, website_url: Option<&str>) -> Option<Reply> {
    match outcome {
        QueryOutcome::Match(found) => {
            let url = web_link(&found.link, website_url);
            Some(Reply {
                text: format!(
                    "<b><a href='{}'>{}</a></b>",
                    escape_html(&url),
                    escape_html(&found.title)
                ),
                button: Some(Button {
                    label: DOWNLOAD_LABEL.to_string(),
                    url,
                }),
            })
        }
        QueryOutcome::NoMatch => Some(Reply::plain(NO_MATCH_TEXT)),
        QueryOutcome::Ignored => None,
        QueryOutcome::TemporaryIssue => Some(Reply::plain(TEMPORARY_ISSUE_TEXT)),
    }
}

/// Escapes text for HTML bodies and single-quoted attribute values
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}
