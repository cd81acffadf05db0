//! Turns a raw model reply into a transcript entry.
//!
//! Quick replies travel inside the free text as a trailing
//! `Suggestions: a, b, c` line. Citations come from the structured grounding
//! metadata and are extracted independently of the text.
//!
//! A reply whose prose legitimately ends in a line starting with
//! "Suggestions:" is indistinguishable from the directive and will be split
//! the same way.

use super::providers::{GroundingMetadata, RawReply};
use crate::types::{ChatMessage, GroundingSource};

const SUGGESTIONS_PREFIX: &str = "suggestions:";

/// Split the trailing suggestions directive off `content`.
///
/// Never fails: anything that is not a well-formed directive on the very last
/// line leaves the text intact and yields no suggestions.
pub fn extract_suggestions(content: &str) -> (String, Option<Vec<String>>) {
    let (body, last_line) = match content.rfind('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => ("", content),
    };

    let is_directive = last_line
        .get(..SUGGESTIONS_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SUGGESTIONS_PREFIX));

    if !is_directive {
        return (content.trim().to_string(), None);
    }

    let suggestions = last_line[SUGGESTIONS_PREFIX.len()..]
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    (body.trim().to_string(), Some(suggestions))
}

/// Collect web citations from grounding metadata.
///
/// Returns `None` when no chunk carries a web citation, so callers never see
/// an empty list.
pub fn extract_sources(metadata: Option<&GroundingMetadata>) -> Option<Vec<GroundingSource>> {
    let sources = metadata?
        .grounding_chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_deref().filter(|uri| !uri.is_empty())?;
            let title = web
                .title
                .as_deref()
                .filter(|title| !title.is_empty())
                .unwrap_or(uri);
            Some(GroundingSource {
                uri: uri.to_string(),
                title: title.to_string(),
            })
        })
        .collect::<Vec<_>>();

    if sources.is_empty() {
        None
    } else {
        Some(sources)
    }
}

/// Build the model-role transcript entry for a successful reply.
pub fn to_chat_message(reply: &RawReply) -> ChatMessage {
    let (text, suggestions) = extract_suggestions(&reply.text);
    let mut message = ChatMessage::model(text);
    message.suggestions = suggestions;
    message.sources = extract_sources(reply.grounding.as_ref());
    message
}
