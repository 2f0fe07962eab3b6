/*! Text extraction from archived HTTP responses.

The payload of a `response` record is the raw HTTP response: a header block, a blank line, then the body.
The body is parsed as HTML, `script` and `style` elements are dropped,
and the remaining text is collapsed into a single line.
!*/
use itertools::Itertools;
use log::debug;
use scraper::Html;

/// Elements whose text content is never kept.
const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Find the start of the body of an HTTP response.
///
/// The boundary is the first `\r\n\r\n`, or the first `\n\n` if there is none.
pub fn http_body(payload: &[u8]) -> Option<&[u8]> {
    let find = |sep: &[u8]| {
        payload
            .windows(sep.len())
            .position(|w| w == sep)
            .map(|pos| pos + sep.len())
    };

    find(b"\r\n\r\n")
        .or_else(|| find(b"\n\n"))
        .map(|start| &payload[start..])
}

/// Get the visible text of an HTML document, on one line and single-spaced.
///
/// HTML parsing is lenient: any input gives a (possibly empty) text.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| SKIPPED_ELEMENTS.contains(&e.name()))
        });

        if !hidden {
            text.push_str(fragment);
        }
    }

    text.split_whitespace().join(" ")
}

/// Extract text from a `response` record payload.
///
/// Returns `None` if the payload has no header/body boundary.
pub fn extract(payload: &[u8]) -> Option<String> {
    match http_body(payload) {
        Some(body) => Some(html_to_text(&String::from_utf8_lossy(body))),
        None => {
            debug!("no header/body boundary in {} bytes of payload", payload.len());
            None
        }
    }
}
