//! Separation of SAS HTML output into LOG and LST streams.

use serde::{Deserialize, Serialize};

/// Style marker of spans holding log text.
const LOG_MARKER: &str = "class=\"err\"";

/// Style marker of spans holding listing output.
const LST_MARKER: &str = "class=\"s\"";

/// LOG and LST text of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Diagnostic and echo text.
    #[serde(rename = "LOG")]
    pub log: String,
    /// Formatted result text.
    #[serde(rename = "LST")]
    pub lst: String,
}

/// Split `html` into LOG and LST text.
///
/// Spans marked `class="err"` go to LOG, spans marked `class="s"` go to LST,
/// everything else is dropped. Never fails.
#[must_use]
pub fn parse_response(html: &str) -> Response {
    let mut response = Response::default();
    for fragment in html.split("</span>") {
        if fragment.contains(LOG_MARKER) {
            response.log.push_str(&clean_fragment(fragment));
        } else if fragment.contains(LST_MARKER) {
            response.lst.push_str(&clean_fragment(fragment));
        }
    }
    response
}

fn clean_fragment(fragment: &str) -> String {
    let (prefix, body) = match first_marked_tag(fragment) {
        Some(start) => fragment.split_at(start),
        None => ("", fragment),
    };
    // Only line breaks survive from text outside the styled span.
    let mut text = "\n".repeat(prefix.matches("<br").count());
    let mut body = body.to_string();
    for marker in [LOG_MARKER, LST_MARKER] {
        body = strip_marked_tags(&body, marker);
    }
    text.push_str(
        &body
            .replace("<br />", "\n")
            .replace("<br/>", "\n")
            .replace("<br>", "\n"),
    );
    text
}

/// Start of the `<` opening the tag that contains `pos`, if any.
fn tag_open(text: &str, pos: usize) -> Option<usize> {
    let open = text[..pos].rfind('<')?;
    (!text[open..pos].contains('>')).then_some(open)
}

fn first_marked_tag(text: &str) -> Option<usize> {
    [LOG_MARKER, LST_MARKER]
        .into_iter()
        .flat_map(|marker| text.match_indices(marker))
        .filter_map(|(pos, _)| tag_open(text, pos))
        .min()
}

/// Remove every opening tag that carries `marker`.
fn strip_marked_tags(text: &str, marker: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        let end = pos + marker.len();
        let Some(open) = tag_open(rest, pos) else {
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        };
        out.push_str(&rest[..open]);
        let after = &rest[end..];
        rest = after.find('>').map_or("", |close| &after[close + 1..]);
    }
    out.push_str(rest);
    out
}
