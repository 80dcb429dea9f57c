//! Content-derived identifiers for dialogue events.
//!
//! Translations are stored under these ids, so the id of a line must only
//! depend on what the line says and when: re-scanning or editing unrelated
//! lines of a file must not move a translation to another line.

/// Build the stable id of a dialogue event: `<start>-<end>-<base36 hash>`.
pub fn dialogue_id(start: &str, end: &str, text: &str) -> String {
    let content = format!("{start}-{end}-{text}");
    format!("{start}-{end}-{}", to_base36(content_hash(&content).unsigned_abs()))
}

/// 32-bit `h * 31 + unit` rolling hash over the UTF-16 code units of `content`.
/// Must stay UTF-16 based: stored translations reference ids hashed that way.
pub fn content_hash(content: &str) -> i32 {
    content
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
