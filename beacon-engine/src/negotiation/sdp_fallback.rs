use std::collections::HashSet;

/// Codecs kept when a description has to be narrowed for a retry commit.
const INTEROPERABLE_CODECS: &[&str] = &["opus", "pcmu", "vp8", "h264"];

/// Reduce a session description to a minimal, widely supported subset.
///
/// Line endings are normalised to CRLF, blank lines and header extensions are
/// dropped, and each media section keeps only payload types mapped to
/// [`INTEROPERABLE_CODECS`]. A section with nothing interoperable keeps its
/// first payload type so bundle mids stay aligned. Returns `None` when the
/// input is not a session description at all.
pub fn normalize_description(sdp: &str) -> Option<String> {
    let lines: Vec<&str> = sdp
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty())
        .collect();

    if !lines.first()?.starts_with("v=") {
        return None;
    }

    let mut out = Vec::with_capacity(lines.len());
    let mut idx = 0;

    while idx < lines.len() && !lines[idx].starts_with("m=") {
        out.push(lines[idx].to_owned());
        idx += 1;
    }

    while idx < lines.len() {
        let start = idx;
        idx += 1;
        while idx < lines.len() && !lines[idx].starts_with("m=") {
            idx += 1;
        }
        out.extend(narrow_media_section(&lines[start..idx]));
    }

    let mut normalized = out.join("\r\n");
    normalized.push_str("\r\n");
    Some(normalized)
}

fn narrow_media_section(section: &[&str]) -> Vec<String> {
    let media_line = section[0];
    let mut parts = media_line.split_whitespace();
    let head: Vec<&str> = parts.by_ref().take(3).collect();
    let formats: Vec<&str> = parts.collect();

    if head.len() < 3 || formats.is_empty() {
        return section.iter().map(|l| (*l).to_owned()).collect();
    }

    let mut keep: Vec<&str> = formats
        .iter()
        .copied()
        .filter(|pt| {
            codec_for(section, pt)
                .is_some_and(|codec| INTEROPERABLE_CODECS.contains(&codec.as_str()))
        })
        .collect();
    if keep.is_empty() {
        keep.push(formats[0]);
    }
    let kept: HashSet<&str> = keep.iter().copied().collect();

    let mut out = Vec::with_capacity(section.len());
    out.push(format!("{} {}", head.join(" "), keep.join(" ")));

    for line in &section[1..] {
        if line.starts_with("a=extmap:") {
            continue;
        }
        if let Some(pt) = payload_attribute(line) {
            if !kept.contains(pt) {
                continue;
            }
        }
        out.push((*line).to_owned());
    }
    out
}

/// Payload type an `a=rtpmap`/`a=fmtp`/`a=rtcp-fb` line refers to.
fn payload_attribute(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("a=rtpmap:")
        .or_else(|| line.strip_prefix("a=fmtp:"))
        .or_else(|| line.strip_prefix("a=rtcp-fb:"))?;
    rest.split_whitespace().next()
}

fn codec_for(section: &[&str], pt: &str) -> Option<String> {
    section.iter().find_map(|line| {
        let rest = line.strip_prefix("a=rtpmap:")?;
        let (id, encoding) = rest.split_once(' ')?;
        if id != pt {
            return None;
        }
        encoding
            .split('/')
            .next()
            .map(|name| name.to_ascii_lowercase())
    })
}
