//! This module is responsible for ASS (Advanced SubStation Alpha) parsing.
//! It extracts script info and dialogue lines, drops lyric captions and
//! gives every remaining line a content-derived id.

use crate::classify::LyricFilter;
use crate::ident::dialogue_id;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

const SCRIPT_INFO: &str = "Script Info";
const EVENTS: &str = "Events";
const DIALOGUE_PREFIX: &str = "Dialogue:";

/// Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect come
/// before the text field.
const PREFIX_FIELDS: usize = 9;

static OVERRIDE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static ESCAPE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[rn]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One dialogue line kept after filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueEvent {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub text: String,
    pub style: String,
    pub actor: String,
}

/// Result of parsing one `.ass` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub info: HashMap<String, String>,
    pub dialogues: Vec<DialogueEvent>,
}

/// Fields of a `Dialogue:` line before any cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDialogue<'a> {
    pub layer: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub style: &'a str,
    pub actor: &'a str,
    pub effect: &'a str,
    pub text: String,
}

/// Parse ASS text with the default lyric filter.
pub fn parse(input: &str) -> ParsedDocument {
    parse_with(input, &LyricFilter::default())
}

/// Parse ASS text into script info and dialogue events.
/// Malformed lines are skipped; parsing never fails.
pub fn parse_with(input: &str, filter: &LyricFilter) -> ParsedDocument {
    trace!("parse_with len={}", input.len());
    let mut doc = ParsedDocument::default();
    let mut section = "";

    for line in input.split('\n').map(str::trim) {
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(name) = section_header(line) {
            section = name;
            continue;
        }
        match section {
            SCRIPT_INFO => {
                if let Some((key, value)) = line.split_once(':') {
                    let key = key.trim();
                    if !key.is_empty() {
                        doc.info.insert(key.to_string(), value.trim().to_string());
                    }
                }
            }
            EVENTS => {
                if let Some(event) = parse_dialogue(line, filter) {
                    doc.dialogues.push(event);
                }
            }
            _ => {}
        }
    }
    debug!(
        "parsed {} info keys and {} dialogue lines",
        doc.info.len(),
        doc.dialogues.len()
    );
    doc
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

/// Split a `Dialogue:` line into its fields.
/// Returns `None` for non-dialogue lines and lines with fewer than ten fields.
pub fn split_dialogue(line: &str) -> Option<RawDialogue<'_>> {
    let rest = line.strip_prefix(DIALOGUE_PREFIX)?;
    let parts: Vec<&str> = rest.split(',').collect();
    if parts.len() <= PREFIX_FIELDS {
        return None;
    }
    Some(RawDialogue {
        layer: parts[0].trim(),
        start: parts[1].trim(),
        end: parts[2].trim(),
        style: parts[3].trim(),
        actor: parts[4].trim(),
        effect: parts[8].trim(),
        // The text field may itself contain commas.
        text: parts[PREFIX_FIELDS..].join(",").trim().to_string(),
    })
}

/// Turn one `Dialogue:` line into an event, or `None` if it is malformed,
/// empty once cleaned, or a lyric caption.
fn parse_dialogue(line: &str, filter: &LyricFilter) -> Option<DialogueEvent> {
    let raw = match split_dialogue(line) {
        Some(raw) => raw,
        None => {
            if line.starts_with(DIALOGUE_PREFIX) {
                debug!("skipping dialogue line with too few fields: {line}");
            }
            return None;
        }
    };
    let text = clean_text(&raw.text);
    if text.is_empty() {
        return None;
    }
    if filter.is_lyric(raw.style, &text, raw.start) {
        return None;
    }
    Some(DialogueEvent {
        id: dialogue_id(raw.start, raw.end, &text),
        start_time: raw.start.to_string(),
        end_time: raw.end.to_string(),
        text,
        style: raw.style.to_string(),
        actor: raw.actor.to_string(),
    })
}

/// Strip `{...}` override blocks and literal `\r`/`\n` markers, then
/// collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let text = OVERRIDE_BLOCK.replace_all(text, "");
    let text = ESCAPE_TOKEN.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const K_ON: &str = "\
[Script Info]
; Script generated by Aegisub
Title: K-ON
Original Script: 华盟字幕社
PlayResX: 848
PlayResY: 480

[V4+ Styles]
Format: Name, Fontname, Fontsize
Style: zhengwen,Arial,20

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:31.29,0:00:33.78,zhengwen,NTP,0,0,0,,お姉ちゃん そろそろ起きないと…
Dialogue: 0,0:01:10.00,0:01:14.00,OPJ,,0,0,0,,{\\k20}キミを見てると いつもハートDOKI☆DOKI
Dialogue: 0,0:03:05.10,0:03:06.20,zhengwen,NTP,0,0,0,,はッ ８時！
Comment: 0,0:03:07.00,0:03:08.00,zhengwen,,0,0,0,,not dialogue
Dialogue: 0,0:03:09.00,0:03:10.00,zhengwen,,0,0,0,,{\\pos(10,10)}
Dialogue: 0,0:03:11.00,0:03:12.00,zhengwen,NTP,0,0,0,,ちッ, 遅刻 遅刻ッ
";

    #[test]
    fn parses_script_info() {
        let doc = parse(K_ON);
        assert_eq!(doc.info["Title"], "K-ON");
        assert_eq!(doc.info["Original Script"], "华盟字幕社");
        assert_eq!(doc.info["PlayResX"], "848");
        assert_eq!(doc.info["PlayResY"], "480");
        assert!(!doc.info.contains_key("Format"));
    }

    #[test]
    fn parses_dialogue_fields() {
        let doc = parse(K_ON);
        let texts: Vec<&str> = doc.dialogues.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["お姉ちゃん そろそろ起きないと…", "はッ ８時！", "ちッ, 遅刻 遅刻ッ"]
        );
        let first = &doc.dialogues[0];
        assert_eq!(first.start_time, "0:00:31.29");
        assert_eq!(first.end_time, "0:00:33.78");
        assert_eq!(first.style, "zhengwen");
        assert_eq!(first.actor, "NTP");
        assert_eq!(first.id, "0:00:31.29-0:00:33.78-tzj8xw");
    }

    #[test]
    fn reparsing_gives_identical_ids() {
        let a: Vec<String> = parse(K_ON).dialogues.into_iter().map(|d| d.id).collect();
        let b: Vec<String> = parse(K_ON).dialogues.into_iter().map(|d| d.id).collect();
        assert_eq!(a, b);
        let unique: std::collections::HashSet<&String> = a.iter().collect();
        assert_eq!(unique.len(), a.len());
    }

    #[test]
    fn editing_other_lines_keeps_ids() {
        let edited = K_ON.replace("はッ ８時！", "はッ ９時！");
        let before = parse(K_ON);
        let after = parse(&edited);
        assert_eq!(before.dialogues[0].id, after.dialogues[0].id);
        assert_eq!(before.dialogues[2].id, after.dialogues[2].id);
        assert_ne!(before.dialogues[1].id, after.dialogues[1].id);
    }

    #[test]
    fn strips_markup() {
        assert_eq!(clean_text("{\\i1}Hello{\\i0} world\\n"), "Hello world");
        assert_eq!(clean_text("a\\rb  \t c"), "ab c");
        assert_eq!(clean_text("{\\pos(1,2)}"), "");
    }

    #[test]
    fn short_dialogue_lines_are_skipped() {
        let doc = parse("[Events]\nDialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0\n");
        assert!(doc.dialogues.is_empty());
        assert!(split_dialogue("Dialogue: 0,1,2,3,4,5,6,7,8").is_none());
        let raw = split_dialogue("Dialogue: 0,1,2,3,4,5,6,7,8,").unwrap();
        assert_eq!(raw.text, "");
    }

    #[test]
    fn dialogue_outside_events_is_ignored() {
        let doc = parse("[Script Info]\nDialogue: 0,0:05:00.00,0:05:01.00,Default,,0,0,0,,hi\n");
        assert!(doc.dialogues.is_empty());
        assert_eq!(doc.info["Dialogue"], "0,0:05:00.00,0:05:01.00,Default,,0,0,0,,hi");
    }

    #[test]
    fn duplicate_info_keys_overwrite() {
        let doc = parse("[Script Info]\nTitle: a\nTitle: b\n: nokey\n");
        assert_eq!(doc.info["Title"], "b");
        assert_eq!(doc.info.len(), 1);
    }

    #[test]
    fn handles_crlf_and_garbage() {
        assert!(parse("").dialogues.is_empty());
        assert!(parse("invalid content").dialogues.is_empty());
        let doc = parse("[Script Info]\r\nTitle: K-ON\r\n[Events]\r\nDialogue: 0,0:05:00.00,0:05:01.00,Default,,0,0,0,,hi\r\n");
        assert_eq!(doc.info["Title"], "K-ON");
        assert_eq!(doc.dialogues[0].text, "hi");
    }
}
