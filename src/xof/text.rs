use crate::xof::preprocess::prepare;
use crate::xof::template::{ArrayLen, Element, MemberSpec, ScalarKind};
use crate::xof::{DecodeContext, Node, Registry, Result, Template, Value, XofError, is_folded};

/// Decode a textual `.x` file (header included) into its generic record tree.
///
/// The returned root is anonymous; its children are the top-level records.
pub fn decode_text_tree(text: &str, ctx: &mut DecodeContext<'_>) -> Result<Node> {
	let content = prepare(text)?;
	let mut reader = TextReader {
		chars: content.chars().collect(),
		pos: 0,
		ctx,
	};
	let root = reader.read(Template::root(), false)?;
	tracing::debug!(records = root.children.len(), chars = reader.chars.len(), "textual payload decoded");
	Ok(root)
}

struct TextReader<'r, 'a> {
	chars: Vec<char>,
	pos: usize,
	ctx: &'r mut DecodeContext<'a>,
}

impl TextReader<'_, '_> {
	fn read(&mut self, template: Template, inline: bool) -> Result<Node> {
		self.ctx.enter()?;
		let out = self.read_record(&template, inline);
		self.ctx.leave();
		out
	}

	fn read_record(&mut self, template: &Template, inline: bool) -> Result<Node> {
		let mut node = Node::new(&template.name, template.key.as_deref());
		let mut start = self.pos;
		let mut quoted = false;
		let mut member = 0;

		while member < template.members.len() {
			if self.at_end() {
				break;
			}
			match template.members[member] {
				MemberSpec::Unknown => {
					if self.skip_unknown(&mut start, &mut quoted)? {
						return Ok(node);
					}
				}
				MemberSpec::AnyChildren => {
					if self.read_children(template, inline, &mut node, &mut start, &mut quoted)? {
						return Ok(node);
					}
				}
				MemberSpec::Array { element, len } => {
					let count = self.array_len(template, &node, len)?;
					let value = match element {
						Element::Scalar(ScalarKind::Dword) => Value::IntArray(self.read_scalar_array(template, count, &mut start, parse_int)?),
						Element::Scalar(ScalarKind::Float) => Value::FloatArray(self.read_scalar_array(template, count, &mut start, parse_float)?),
						Element::Scalar(ScalarKind::String) => return Err(self.syntax(template, "string arrays are not supported")),
						Element::Record(name) => Value::NodeArray(self.read_record_array(template, name, count)?),
					};
					node.children.push(value);
					start = self.pos;
					member += 1;
				}
				MemberSpec::Scalar(ScalarKind::Dword) => {
					if let Some(value) = self.read_dword(template, &mut start)? {
						node.children.push(value);
					}
					member += 1;
				}
				MemberSpec::Scalar(ScalarKind::Float) => {
					if let Some(value) = self.read_float(template, &mut start)? {
						node.children.push(value);
					}
					member += 1;
				}
				MemberSpec::Scalar(ScalarKind::String) => {
					let text = self.read_string(template)?;
					node.children.push(Value::String(text.into()));
					start = self.pos;
					member += 1;
				}
				MemberSpec::Nested(name) => {
					let nested = self.ctx.resolve(name);
					let child = self.read(nested, true)?;
					self.expect_semicolon(template, "unexpected character after inline record")?;
					node.children.push(Value::Node(child));
					start = self.pos;
					member += 1;
				}
				MemberSpec::References => {
					self.read_references(&mut node);
					start = self.pos;
					member += 1;
				}
			}
		}

		if member < template.members.len() {
			if quoted {
				return Err(self.syntax(template, "quotation mark not closed at end of file"));
			}
			if !template.is_root() {
				return Err(self.syntax(template, "unexpected end of file"));
			}
			return Ok(node);
		}

		if inline {
			return Ok(node);
		}
		while let Some(ch) = self.peek() {
			match ch {
				';' => self.pos += 1,
				'}' => {
					self.pos += 1;
					return Ok(node);
				}
				ch if ch.is_whitespace() => self.pos += 1,
				_ => return Err(self.syntax(template, "unexpected character before closing brace")),
			}
		}
		Err(self.syntax(template, "unexpected end of file before closing brace"))
	}

	/// Skip opaque content up to the closing brace. Returns `true` once closed.
	fn skip_unknown(&mut self, start: &mut usize, quoted: &mut bool) -> Result<bool> {
		while let Some(ch) = self.peek() {
			if *quoted {
				if ch == '"' {
					*quoted = false;
				}
				self.pos += 1;
				continue;
			}
			match ch {
				'"' => *quoted = true,
				',' | ';' => *start = self.pos + 1,
				'{' => {
					let name = self.slice(*start, self.pos);
					self.pos += 1;
					let nested = self.ctx.resolve(&name);
					self.read(nested, false)?;
					*start = self.pos;
					continue;
				}
				'}' => {
					self.pos += 1;
					return Ok(true);
				}
				_ => {}
			}
			self.pos += 1;
		}
		Ok(false)
	}

	/// Read named child records up to the closing brace. Returns `true` once closed.
	fn read_children(&mut self, template: &Template, inline: bool, node: &mut Node, start: &mut usize, quoted: &mut bool) -> Result<bool> {
		while let Some(ch) = self.peek() {
			if *quoted {
				if ch == '"' {
					*quoted = false;
				}
				self.pos += 1;
				continue;
			}
			match ch {
				'"' => *quoted = true,
				'{' => {
					let name = self.slice(*start, self.pos);
					self.pos += 1;
					self.ctx.tick()?;
					let nested = self.ctx.resolve(&name);
					let child = self.read(nested, false)?;
					if !is_folded(&name) {
						node.children.push(Value::Node(child));
					}
					*start = self.pos;
					continue;
				}
				'}' => {
					if inline {
						return Err(self.syntax(template, "unexpected closing brace in inline record"));
					}
					self.pos += 1;
					return Ok(true);
				}
				',' => return Err(self.syntax(template, "unexpected comma")),
				';' => {
					if inline {
						self.pos += 1;
						return Ok(true);
					}
					if template.name != "MeshMaterialList" {
						return Err(self.syntax(template, "unexpected semicolon"));
					}
					*start += 1;
				}
				_ => {}
			}
			self.pos += 1;
		}
		Ok(false)
	}

	fn array_len(&self, template: &Template, node: &Node, len: ArrayLen) -> Result<usize> {
		let count = match len {
			ArrayLen::Fixed(count) => count,
			ArrayLen::Member(idx) => {
				let declared = node.children.get(idx).and_then(Value::as_int).ok_or_else(|| self.syntax(template, "array length does not refer to a DWORD member"))?;
				usize::try_from(declared).map_err(|_| self.syntax(template, "negative array length"))?
			}
		};
		self.ctx.check_array(count)
	}

	fn read_scalar_array<T: Default>(&mut self, template: &Template, count: usize, start: &mut usize, parse: fn(&str) -> Option<T>) -> Result<Vec<T>> {
		if count == 0 {
			self.skip_empty_array(template, false)?;
			return Ok(Vec::new());
		}

		let mut out = Vec::with_capacity(count);
		for k in 0..count {
			let last = k + 1 == count;
			loop {
				let Some(ch) = self.peek() else {
					return Err(self.syntax(template, "array was not terminated at end of file"));
				};
				match ch {
					'{' | '}' | '"' => return Err(self.syntax(template, "invalid character in scalar array")),
					',' if last => return Err(count_mismatch(count, count + 1)),
					';' if !last => return Err(count_mismatch(count, k + 1)),
					',' | ';' => break,
					_ => self.pos += 1,
				}
			}
			let text = self.slice(*start, self.pos);
			let at = *start;
			self.pos += 1;
			*start = self.pos;
			out.push(match parse(&text) {
				Some(value) => value,
				None => {
					self.ctx.warn_scalar(&template.name, at, &text, "array element");
					T::default()
				}
			});
		}
		Ok(out)
	}

	fn read_record_array(&mut self, template: &Template, name: &str, count: usize) -> Result<Vec<Node>> {
		if count == 0 {
			self.skip_empty_array(template, name == "MeshFace")?;
			return Ok(Vec::new());
		}

		let element = self.ctx.resolve(name);
		let mut out = Vec::with_capacity(count);
		for k in 0..count {
			out.push(self.read(element.clone(), true)?);
			if k + 1 < count {
				self.skip_element_separator(template, &element, count, k + 1)?;
			} else {
				self.expect_semicolon(template, "array was not terminated")?;
			}
		}
		Ok(out)
	}

	fn skip_element_separator(&mut self, template: &Template, element: &Template, declared: usize, read: usize) -> Result<()> {
		while let Some(ch) = self.peek() {
			match ch {
				',' => {
					self.pos += 1;
					return Ok(());
				}
				';' => return Err(count_mismatch(declared, read)),
				// Some exporters omit the comma between texture coordinates.
				ch if (ch.is_ascii_digit() || ch == '-') && element.name == "Coords2d" => return Ok(()),
				ch if ch.is_whitespace() => self.pos += 1,
				_ => return Err(self.syntax(template, "invalid character between array elements")),
			}
		}
		Err(self.syntax(template, "array was not continued at end of file"))
	}

	/// Zero-element array: an optional bare `;`.
	fn skip_empty_array(&mut self, template: &Template, allow_final_brace: bool) -> Result<()> {
		while let Some(ch) = self.peek() {
			if ch == ';' {
				self.pos += 1;
				break;
			}
			if self.pos > 0 && self.chars[self.pos - 1] == ';' {
				break;
			}
			if ch == '}' && allow_final_brace && self.pos + 1 == self.chars.len() {
				break;
			}
			if !ch.is_whitespace() {
				return Err(self.syntax(template, "invalid character in empty array"));
			}
			self.pos += 1;
		}
		Ok(())
	}

	fn read_dword(&mut self, template: &Template, start: &mut usize) -> Result<Option<Value>> {
		while let Some(ch) = self.peek() {
			match ch {
				'{' | '}' | ',' | '"' => return Err(self.syntax(template, "invalid character in DWORD")),
				';' => {
					let text = self.slice(*start, self.pos);
					let value = match parse_int(&text) {
						Some(value) => Value::Int(value),
						None => {
							self.ctx.warn_scalar(&template.name, *start, &text, "DWORD");
							Value::String(text.into())
						}
					};
					self.pos += 1;
					*start = self.pos;
					return Ok(Some(value));
				}
				_ => self.pos += 1,
			}
		}
		Ok(None)
	}

	fn read_float(&mut self, template: &Template, start: &mut usize) -> Result<Option<Value>> {
		while let Some(ch) = self.peek() {
			match ch {
				'{' | '}' | '"' => return Err(self.syntax(template, "invalid character in float")),
				';' | ',' => {
					let text = self.slice(*start, self.pos);
					let value = if text.is_empty() {
						Value::Float(0.0)
					} else if let Some(value) = parse_float(&text) {
						Value::Float(value)
					} else {
						self.ctx.warn_scalar(&template.name, *start, &text, "float");
						Value::String(text.into())
					};
					self.pos += 1;
					*start = self.pos;
					return Ok(Some(value));
				}
				_ => self.pos += 1,
			}
		}
		Ok(None)
	}

	fn read_string(&mut self, template: &Template) -> Result<String> {
		loop {
			match self.peek() {
				None => return Err(self.syntax(template, "unexpected end of file in string")),
				Some('"') => {
					self.pos += 1;
					break;
				}
				Some(ch) if ch.is_whitespace() => self.pos += 1,
				Some(_) => return Err(self.syntax(template, "expected opening quotation mark")),
			}
		}

		let open = self.pos;
		while self.peek().is_some_and(|ch| ch != '"') {
			self.pos += 1;
		}
		if self.at_end() {
			return Err(self.syntax(template, "unexpected end of file in string"));
		}
		let text: String = self.chars[open..self.pos].iter().collect();
		self.pos += 1;

		loop {
			match self.peek() {
				None => return Err(self.syntax(template, "unexpected end of file after string")),
				Some(';' | ',') => {
					self.pos += 1;
					return Ok(text);
				}
				Some(ch) if ch.is_whitespace() => self.pos += 1,
				Some(_) => return Err(self.syntax(template, "unexpected character after string")),
			}
		}
	}

	/// Material references written `{ Name }` or `Name;`.
	///
	/// Stops without consuming anything at the first item that is not a
	/// reference (a child record, the closing brace, a template name).
	fn read_references(&mut self, node: &mut Node) {
		loop {
			let mark = self.pos;
			while self.peek().is_some_and(|ch| ch == ';' || ch.is_whitespace()) {
				self.pos += 1;
			}
			let reference = match self.peek() {
				Some('{') => self.scan_reference(self.pos + 1, '}'),
				Some(ch) if is_name_char(ch) => self.scan_reference(self.pos, ';'),
				_ => None,
			};
			match reference {
				Some((name, end)) => {
					node.children.push(Value::String(name.into()));
					self.pos = end;
				}
				None => {
					self.pos = mark;
					return;
				}
			}
		}
	}

	fn scan_reference(&self, from: usize, close: char) -> Option<(String, usize)> {
		let mut end = from;
		while let Some(&ch) = self.chars.get(end) {
			if ch == close {
				let name = self.slice(from, end);
				let valid = !name.is_empty() && !name.contains(char::is_whitespace) && !Registry::global().is_template_name(&name);
				return valid.then_some((name, end + 1));
			}
			if !is_name_char(ch) && !ch.is_whitespace() {
				return None;
			}
			end += 1;
		}
		None
	}

	fn expect_semicolon(&mut self, template: &Template, reason: &'static str) -> Result<()> {
		while let Some(ch) = self.peek() {
			match ch {
				';' => {
					self.pos += 1;
					return Ok(());
				}
				ch if ch.is_whitespace() => self.pos += 1,
				_ => return Err(self.syntax(template, reason)),
			}
		}
		Err(self.syntax(template, "unexpected end of file"))
	}

	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn at_end(&self) -> bool {
		self.pos >= self.chars.len()
	}

	fn slice(&self, from: usize, to: usize) -> String {
		let to = to.min(self.chars.len());
		let from = from.min(to);
		self.chars[from..to].iter().collect::<String>().trim().to_owned()
	}

	fn syntax(&self, template: &Template, reason: &'static str) -> XofError {
		XofError::Syntax {
			at: self.pos,
			template: template.name.as_ref().into(),
			reason,
		}
	}
}

fn count_mismatch(declared: usize, actual: usize) -> XofError {
	XofError::CountMismatch {
		what: "array elements",
		declared: declared as i64,
		actual,
	}
}

fn is_name_char(ch: char) -> bool {
	!ch.is_whitespace() && !matches!(ch, '{' | '}' | ';' | ',' | '"')
}

fn parse_int(text: &str) -> Option<i32> {
	text.trim().parse().ok()
}

fn parse_float(text: &str) -> Option<f64> {
	text.trim().parse().ok()
}

#[cfg(test)]
mod tests;
