//! Line-level cleanup applied to textual payloads before parsing.
//!
//! The pass runs in four steps: split into lines, drop comments and collapse
//! whitespace, repair terminators, then strip the magic header and join
//! everything into one content string.

use crate::xof::{Result, XofError, XofHeader};

/// Normalize a textual `.x` file (header included) into one content string.
pub fn prepare(text: &str) -> Result<String> {
	let mut lines = split_lines(text);
	strip_comments(&mut lines);
	repair_terminators(&mut lines);

	let first = lines.first().map(String::as_str).unwrap_or_default();
	let Some((cut, _)) = first.char_indices().nth(XofHeader::SIZE - 1) else {
		return Err(XofError::Syntax {
			at: 0,
			template: "".into(),
			reason: "first line is shorter than the file header",
		});
	};
	let cut = cut + first[cut..].chars().next().map_or(0, char::len_utf8);

	let mut content = String::with_capacity(text.len());
	content.push_str(&first[cut..]);
	for line in lines.iter().skip(1) {
		content.push_str(line);
	}
	Ok(content)
}

/// Split on every line terminator the format tolerates.
///
/// `\r\n` counts as one break; lone `\r`, `\n`, form feed, NEL and the
/// Unicode line/paragraph separators each end a line.
pub fn split_lines(text: &str) -> Vec<String> {
	let mut lines = Vec::new();
	let mut current = String::new();
	let mut chars = text.chars().peekable();
	while let Some(ch) = chars.next() {
		match ch {
			'\r' => {
				if chars.peek() == Some(&'\n') {
					chars.next();
				}
				lines.push(std::mem::take(&mut current));
			}
			'\n' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}' => lines.push(std::mem::take(&mut current)),
			other => current.push(other),
		}
	}
	lines.push(current);
	lines
}

/// Remove `#` and `//` comments outside quoted strings, then collapse runs of
/// whitespace to single spaces.
///
/// Quote state carries across lines.
pub fn strip_comments(lines: &mut [String]) {
	let mut quoted = false;
	for line in lines.iter_mut() {
		let mut cut = None;
		let mut chars = line.char_indices().peekable();
		while let Some((idx, ch)) = chars.next() {
			if ch == '"' {
				quoted = !quoted;
			}
			if quoted {
				continue;
			}
			let slashes = ch == '/' && chars.peek().is_some_and(|(_, next)| *next == '/');
			if ch == '#' || slashes {
				cut = Some(idx);
				break;
			}
		}
		if let Some(idx) = cut {
			line.truncate(idx);
		}
		*line = line.split_whitespace().collect::<Vec<_>>().join(" ");
	}
}

/// Rewrite line endings of common exporter variants into the canonical
/// `;`/`,` terminator grammar.
///
/// Three rules run per line `i`, in order:
///
/// 1. A line with exactly one comma and text after it (`u,v;` style
///    coordinates) becomes `u;v;` (or `u;v;,` when it already ended in `;`).
/// 2. When the line looks like an array element (four or more comma parts
///    ending in `,`; three or more ending in `;;` after a line not ending in
///    `;,`; or three or more ending in `;` after a line ending in `;`), the
///    part before its last is not `;`-terminated, and the previous line is
///    longer than five characters and does not open a brace, the previous
///    line's final character is replaced by `;,` so it separates elements.
/// 3. When the line opens or closes a brace and the previous line ends in
///    `;,`, that ending becomes `;;` so the preceding array is closed.
///
/// These rules match output of specific broken exporters and are not a
/// general grammar repair.
pub fn repair_terminators(lines: &mut [String]) {
	for i in 0..lines.len() {
		let parts: Vec<String> = lines[i].split(',').map(str::to_owned).collect();
		if parts.len() == 2 && !parts[1].trim().is_empty() {
			let tail = if parts[1].ends_with(';') {
				format!("{},", parts[1])
			} else {
				format!("{};", parts[1])
			};
			lines[i] = format!("{};{}", parts[0], tail);
		} else if i > 0 && joins_previous(&parts, &lines[i], &lines[i - 1]) {
			let prev = &mut lines[i - 1];
			prev.pop();
			prev.push_str(";,");
		}

		if i > 0 && (lines[i].contains('{') || lines[i].contains('}')) && lines[i - 1].ends_with(";,") {
			let prev = &mut lines[i - 1];
			prev.pop();
			prev.pop();
			prev.push_str(";;");
		}
	}
}

fn joins_previous(parts: &[String], line: &str, prev: &str) -> bool {
	let prev_long = prev.chars().count() > 5;
	let element = (parts.len() >= 4 && line.ends_with(','))
		|| (parts.len() >= 3 && line.ends_with(";;") && !prev.ends_with(";,"))
		|| (parts.len() >= 3 && line.ends_with(';') && prev_long && prev.ends_with(';'));
	let open_before_last = parts.len() >= 2 && !parts[parts.len() - 2].ends_with(';');
	element && open_before_last && prev_long && !prev.ends_with('{')
}
