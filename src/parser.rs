//! Message normalization: raw RFC 5322 bytes into a [`NormalizedEmail`].
//!
//! Body selection prefers the first `text/plain` part, taken verbatim.
//! HTML-only messages go through a structural tag tokenizer and a
//! double entity-decode pass; some providers escape their entities
//! twice (`&amp;oacute;` must end up as `ó`, not `&oacute;`).

use crate::error::{ParseError, Result};
use crate::types::{EmailAddress, NormalizedEmail};
use chrono::{DateTime, Utc};
use mailparse::DispositionType;
use tracing::debug;

/// Parse raw message bytes into a normalized email.
///
/// Only a structurally unparseable message errors. Missing headers and
/// undecodable parts degrade: empty subject, empty sender, empty body.
pub fn parse_message(raw: &[u8]) -> Result<NormalizedEmail> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| ParseError::Structure(e.to_string()))?;

    let subject = header_value(&parsed.headers, "subject").unwrap_or_default();
    let from = header_value(&parsed.headers, "from")
        .and_then(|v| EmailAddress::parse(&v))
        .unwrap_or_else(EmailAddress::empty);
    let sent_at = extract_date(&parsed.headers);
    let has_attachments = has_attachments(&parsed);
    let body_text = extract_body_text(&parsed);

    debug!(
        from = %from.address,
        subject = %subject,
        bytes = body_text.len(),
        "normalized message"
    );

    Ok(NormalizedEmail {
        subject,
        from,
        sent_at,
        body_text,
        has_attachments,
    })
}

fn header_value(headers: &[mailparse::MailHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case(name))
        .map(mailparse::MailHeader::get_value)
}

fn extract_date(headers: &[mailparse::MailHeader]) -> Option<DateTime<Utc>> {
    // No wall-clock fallback: a fabricated timestamp would make two
    // runs over the same message disagree.
    header_value(headers, "date")
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Pick the body text per the plain-first contract.
fn extract_body_text(parsed: &mailparse::ParsedMail) -> String {
    let (plain, html) = collect_body_parts(parsed);

    if let Some(text) = plain {
        return text;
    }
    if let Some(markup) = html {
        let stripped = strip_tags(&markup);
        // Two passes: the second resolves entities that were themselves
        // entity-encoded.
        let decoded = decode_entities(&decode_entities(&stripped));
        return tidy_lines(&decoded);
    }
    String::new()
}

/// Walk the part tree and pull the first `text/plain` and first
/// `text/html` payloads, skipping attachment parts.
fn collect_body_parts(parsed: &mailparse::ParsedMail) -> (Option<String>, Option<String>) {
    let mut plain: Option<String> = None;
    let mut html: Option<String> = None;
    collect_recursive(parsed, &mut plain, &mut html);
    (plain, html)
}

fn collect_recursive(
    part: &mailparse::ParsedMail,
    plain: &mut Option<String>,
    html: &mut Option<String>,
) {
    if part.subparts.is_empty() {
        if is_attachment(part) {
            return;
        }
        let mimetype = part.ctype.mimetype.to_lowercase();
        if let Ok(body) = part.get_body() {
            if mimetype.contains("text/plain") && plain.is_none() {
                *plain = Some(body);
            } else if mimetype.contains("text/html") && html.is_none() {
                *html = Some(body);
            }
        }
    } else {
        for sub in &part.subparts {
            collect_recursive(sub, plain, html);
        }
    }
}

fn is_attachment(part: &mailparse::ParsedMail) -> bool {
    let disposition = part.get_content_disposition();
    disposition.disposition == DispositionType::Attachment
        || disposition.params.contains_key("filename")
}

/// Whether any part of the message is an attachment.
///
/// Bills from the supported providers always arrive with the PDF
/// attached; the inbox scan uses this to skip unrelated mail.
fn has_attachments(parsed: &mailparse::ParsedMail) -> bool {
    if is_attachment(parsed) {
        return true;
    }
    parsed.subparts.iter().any(has_attachments)
}

/// Remove markup with a small stateful tokenizer.
///
/// Handles nested and unclosed tags, drops `<script>`/`<style>` bodies
/// entirely, and emits a newline after block-level closers so labels
/// and values stay on separate logical lines.
fn strip_tags(html: &str) -> String {
    let chars: Vec<char> = html.chars().collect();
    let lower: Vec<char> = html.to_lowercase().chars().collect();

    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;
    let mut tag_start = 0usize;

    let starts_with = |from: usize, needle: &str| -> bool {
        let mut it = lower[from..].iter();
        needle.chars().all(|n| it.next() == Some(&n))
    };

    let mut i = 0;
    while i < chars.len() {
        if !in_tag && chars[i] == '<' {
            tag_start = i;
            if starts_with(i, "<script") {
                in_script = true;
            } else if starts_with(i, "</script") {
                in_script = false;
            } else if starts_with(i, "<style") {
                in_style = true;
            } else if starts_with(i, "</style") {
                in_style = false;
            }
            in_tag = true;
        } else if in_tag && chars[i] == '>' {
            in_tag = false;
            let tag: String = lower[tag_start + 1..i].iter().collect();
            if tag.starts_with("br")
                || tag.starts_with("/p")
                || tag.starts_with("/tr")
                || tag.starts_with("/td")
                || tag.starts_with("/div")
                || tag.starts_with("/li")
                || tag.starts_with("/h")
            {
                result.push('\n');
            }
        } else if !in_tag && !in_script && !in_style {
            result.push(chars[i]);
        }
        i += 1;
    }

    result
}

/// Decode one level of HTML entity escaping.
///
/// Covers the named entities the supported providers emit plus decimal
/// and hex numeric references. Unrecognized sequences pass through
/// unchanged.
fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '&' {
            result.push(c);
            continue;
        }

        // Entity candidate: up to the next ';' within a short window.
        let rest = &text[start + 1..];
        let Some(semi) = rest.find(';').filter(|&n| n > 0 && n <= 10) else {
            result.push('&');
            continue;
        };
        let entity = &rest[..semi];

        match decode_entity(entity) {
            Some(decoded) => {
                result.push_str(&decoded);
                // Skip past the entity body and its semicolon.
                for _ in 0..=semi {
                    chars.next();
                }
            }
            None => result.push('&'),
        }
    }

    result
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = num.strip_prefix(['x', 'X']).map_or_else(
            || num.parse::<u32>().ok(),
            |hex| u32::from_str_radix(hex, 16).ok(),
        )?;
        return char::from_u32(code).map(String::from);
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "aacute" => "á",
        "eacute" => "é",
        "iacute" => "í",
        "oacute" => "ó",
        "uacute" => "ú",
        "Aacute" => "Á",
        "Eacute" => "É",
        "Iacute" => "Í",
        "Oacute" => "Ó",
        "Uacute" => "Ú",
        "ntilde" => "ñ",
        "Ntilde" => "Ñ",
        "uuml" => "ü",
        "ordm" => "º",
        "ordf" => "ª",
        "deg" => "°",
        "iexcl" => "¡",
        "iquest" => "¿",
        _ => return None,
    };
    Some(decoded.to_string())
}

fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_entities_single_pass() {
        assert_eq!(decode_entities("Direcci&oacute;n"), "Dirección");
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#243;"), "ó");
        assert_eq!(decode_entities("&#xF3;"), "ó");
    }

    #[test]
    fn decode_entities_leaves_unknown_alone() {
        assert_eq!(decode_entities("&bogus; & plain"), "&bogus; & plain");
    }

    #[test]
    fn double_pass_resolves_nested_escape() {
        let once = decode_entities("Direcci&amp;oacute;n");
        assert_eq!(once, "Direcci&oacute;n");
        assert_eq!(decode_entities(&once), "Dirección");
    }

    #[test]
    fn strip_tags_drops_script_and_style() {
        let html = "<div>hola</div><script>var x = 1;</script><style>p{}</style><p>chao</p>";
        let text = strip_tags(html);
        assert!(text.contains("hola"));
        assert!(text.contains("chao"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("p{}"));
    }

    #[test]
    fn strip_tags_tolerates_unclosed_tag() {
        assert_eq!(strip_tags("antes <b fin"), "antes ");
    }

    #[test]
    fn block_closers_break_lines() {
        let text = strip_tags("<tr><td>Total a pagar</td><td>$24.580</td></tr>");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["Total a pagar", "$24.580"]);
    }
}
