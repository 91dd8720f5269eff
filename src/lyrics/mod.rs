//! Lyric expansion: raw song text plus a verse order into slide texts.
//!
//! Lyrics are written as sections headed by a label line such as `Verse 1`
//! or `Chorus`. A verse order like `V1 C1 V2 C1` lists section keys (first
//! letter of the label plus its number) in projection order. Each section is
//! split on blank lines, one slide per stanza.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Regex matching section header lines like `Verse 1`, `chorus` or `Bridge 2`.
#[allow(clippy::expect_used)]
static RE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(verse|chorus|bridge|intro|ending|other)\s*(\d+)?\s*:?\s*$")
        .expect("valid regex: RE_SECTION")
});

/// One labelled block of lyrics.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    key: String,
    stanzas: Vec<String>,
}

/// Short key for a header: `Verse 2` is `V2`, a bare `Chorus` is `C1`.
fn section_key(label: &str, number: Option<&str>) -> String {
    let initial = label
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('O');
    format!("{initial}{}", number.unwrap_or("1"))
}

fn split_stanzas(lines: &[&str]) -> Vec<String> {
    lines
        .split(|line| line.trim().is_empty())
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.join("\n"))
        .collect()
}

fn parse_sections(lyrics: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut key: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |key: Option<String>, body: &mut Vec<&str>| {
        let stanzas = split_stanzas(body);
        body.clear();
        if stanzas.is_empty() {
            return;
        }
        sections.push(Section {
            key: key.unwrap_or_else(|| "V1".to_string()),
            stanzas,
        });
    };

    for line in lyrics.lines() {
        if let Some(caps) = RE_SECTION.captures(line) {
            let label = caps.get(1).map_or("", |m| m.as_str());
            let number = caps.get(2).map(|m| m.as_str());
            flush(key.take(), &mut body);
            key = Some(section_key(label, number));
        } else {
            body.push(line);
        }
    }
    flush(key, &mut body);
    sections
}

/// Expand `lyrics` into slide texts.
///
/// With a verse order, sections are emitted in that order (repeats allowed,
/// unknown keys skipped). Without one, or when nothing in the order matches,
/// sections appear as written.
pub fn lyric_slides(lyrics: &str, verse_order: Option<&str>) -> Vec<String> {
    let sections = parse_sections(lyrics);
    let by_key: HashMap<&str, &Section> = sections.iter().map(|s| (s.key.as_str(), s)).collect();

    let ordered: Vec<&Section> = verse_order
        .map(|order| {
            order
                .split_whitespace()
                .filter_map(|token| {
                    let key = token.to_ascii_uppercase();
                    let found = by_key.get(key.as_str()).copied();
                    if found.is_none() {
                        debug!(token, "Verse order names an unknown section");
                    }
                    found
                })
                .collect()
        })
        .unwrap_or_default();

    let ordered = if ordered.is_empty() {
        sections.iter().collect()
    } else {
        ordered
    };

    ordered
        .into_iter()
        .flat_map(|section| section.stanzas.iter().cloned())
        .collect()
}
