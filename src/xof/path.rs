use std::fs;
use std::path::{Path, PathBuf};

const ILLEGAL: &[char] = &['"', '<', '>', '|', '*', '?'];

/// Whether `text` contains characters that cannot appear in a file reference.
pub fn contains_illegal_chars(text: &str) -> bool {
	text.chars().any(|ch| ch.is_control() || ILLEGAL.contains(&ch))
}

/// Whether a file reference is absolute in either Unix or Windows spelling.
pub fn is_absolute(text: &str) -> bool {
	let bytes = text.as_bytes();
	if matches!(bytes.first(), Some(b'/' | b'\\')) {
		return true;
	}
	bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Last component of a reference split on either separator.
pub fn file_name(text: &str) -> &str {
	text.rsplit(['/', '\\']).next().unwrap_or(text)
}

/// Join a relative reference onto `base`.
///
/// Both separators are accepted. Each component is matched exactly first and
/// then case-insensitively against the entries of the directory built so far,
/// so references written on case-insensitive filesystems still resolve.
pub fn combine(base: &Path, reference: &str) -> PathBuf {
	let mut out = base.to_path_buf();
	for component in reference.split(['/', '\\']) {
		match component {
			"" | "." => {}
			".." => {
				out.pop();
			}
			name => {
				let exact = out.join(name);
				out = if exact.exists() {
					exact
				} else {
					find_ignoring_case(&out, name).unwrap_or(exact)
				};
			}
		}
	}
	out
}

/// Turn a reference into a path, normalizing separators for absolute references.
pub fn absolute(reference: &str) -> PathBuf {
	if std::path::MAIN_SEPARATOR == '/' {
		PathBuf::from(reference.replace('\\', "/"))
	} else {
		PathBuf::from(reference)
	}
}

fn find_ignoring_case(dir: &Path, name: &str) -> Option<PathBuf> {
	let entries = fs::read_dir(dir).ok()?;
	entries
		.filter_map(|entry| entry.ok())
		.find(|entry| entry.file_name().to_str().is_some_and(|candidate| candidate.eq_ignore_ascii_case(name)))
		.map(|entry| entry.path())
}
