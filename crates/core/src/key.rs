//! Storage keys for translations and progress.
//!
//! Episode ids reach us through URLs, sometimes percent-encoded once, twice or
//! not at all. Every form of the same id must land on the same key, so ids are
//! decoded until stable and then encoded exactly once.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left alone by URI component encoding.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TRANSLATION_PREFIX: &str = "translation";
const PROGRESS_PREFIX: &str = "progress";

/// Components of a translation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationKey {
    /// Canonical (normalized) episode id.
    pub episode_id: String,
    pub subtitle_id: String,
}

/// Percent-encode `s` the way a URI component is encoded.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Decode one layer of percent-encoding. `None` when a `%` is not followed by
/// two hex digits or the decoded bytes are not UTF-8.
pub fn decode_component(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(s)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Canonical form of an episode id: decode to a fixpoint, encode once.
/// A decode failure stops decoding at the last good value. Each layer that
/// changes the string shortens it, so the loop ends on any input depth.
pub fn normalize_episode_id(episode_id: &str) -> String {
    let mut decoded = episode_id.to_string();
    while let Some(next) = decode_component(&decoded) {
        if next == decoded {
            break;
        }
        decoded = next;
    }
    encode_component(&decoded)
}

/// Whether two episode ids name the same episode modulo encoding.
pub fn episode_ids_equal(a: &str, b: &str) -> bool {
    normalize_episode_id(a) == normalize_episode_id(b)
}

/// `translation:<canonical episode id>:<subtitle id>`
pub fn translation_key(episode_id: &str, subtitle_id: &str) -> String {
    format!(
        "{TRANSLATION_PREFIX}:{}:{subtitle_id}",
        normalize_episode_id(episode_id)
    )
}

/// Pattern matching every translation key of one episode.
pub fn translation_pattern(episode_id: &str) -> String {
    format!("{TRANSLATION_PREFIX}:{}:*", normalize_episode_id(episode_id))
}

/// Pattern matching every translation key.
pub fn all_translations_pattern() -> String {
    format!("{TRANSLATION_PREFIX}:*")
}

/// Split a translation key back into its parts.
/// Only the first two colons delimit; subtitle ids contain colons themselves.
pub fn parse_translation_key(key: &str) -> Option<TranslationKey> {
    let mut parts = key.splitn(3, ':');
    if parts.next()? != TRANSLATION_PREFIX {
        return None;
    }
    let episode_id = parts.next()?;
    let subtitle_id = parts.next()?;
    if episode_id.is_empty() || subtitle_id.is_empty() {
        return None;
    }
    Some(TranslationKey {
        episode_id: episode_id.to_string(),
        subtitle_id: subtitle_id.to_string(),
    })
}

/// `progress:<user id>:<canonical episode id>`
pub fn progress_key(user_id: &str, episode_id: &str) -> String {
    format!(
        "{PROGRESS_PREFIX}:{user_id}:{}",
        normalize_episode_id(episode_id)
    )
}

/// Pattern matching every progress key of one user.
pub fn progress_pattern(user_id: &str) -> String {
    format!("{PROGRESS_PREFIX}:{user_id}:*")
}
