//! Token stream decoder for binary `.x` payloads.
//!
//! The payload is a flat sequence of little-endian `u16` token codes, some of
//! which carry data. Scalars travel in batched integer and float lists that may
//! span several members and records, so the reader keeps at most one partially
//! consumed list of each kind between members.

use crate::xof::bytes::Cursor;
use crate::xof::template::{ArrayLen, Element, MemberSpec, ScalarKind};
use crate::xof::{DecodeContext, FloatWidth, Node, Result, Template, Value, XofError, XofHeader, is_folded};

const TOKEN_NAME: u16 = 1;
const TOKEN_STRING: u16 = 2;
const TOKEN_INTEGER: u16 = 3;
const TOKEN_GUID: u16 = 5;
const TOKEN_INTEGER_LIST: u16 = 6;
const TOKEN_FLOAT_LIST: u16 = 7;
const TOKEN_OBRACE: u16 = 10;
const TOKEN_CBRACE: u16 = 11;
const TOKEN_COMMA: u16 = 19;
const TOKEN_SEMICOLON: u16 = 20;
const TOKEN_TEMPLATE: u16 = 31;

const GUID_BYTES: usize = 16;

/// Decode a binary payload (the bytes after the 16-byte header) into its
/// generic record tree.
pub fn decode_binary_tree(payload: &[u8], width: FloatWidth, ctx: &mut DecodeContext<'_>) -> Result<Node> {
	let mut reader = BinaryReader {
		cursor: Cursor::new(payload),
		width,
		ints: Vec::new(),
		floats: Vec::new(),
		ctx,
	};
	let root = reader.read(Template::root(), false)?;
	tracing::debug!(records = root.children.len(), bytes = payload.len(), bits = width.bits(), "binary payload decoded");
	Ok(root)
}

struct BinaryReader<'p, 'r, 'a> {
	cursor: Cursor<'p>,
	width: FloatWidth,
	/// Pending integers, reversed so `pop` yields file order.
	ints: Vec<i32>,
	/// Pending floats, reversed so `pop` yields file order.
	floats: Vec<f64>,
	ctx: &'r mut DecodeContext<'a>,
}

impl BinaryReader<'_, '_, '_> {
	fn read(&mut self, template: Template, inline: bool) -> Result<Node> {
		self.ctx.enter()?;
		let out = self.read_record(&template, inline);
		self.ctx.leave();
		out
	}

	fn read_record(&mut self, template: &Template, inline: bool) -> Result<Node> {
		let mut node = Node::new(&template.name, template.key.as_deref());

		for member in template.members {
			match *member {
				MemberSpec::Unknown => {
					self.ensure_drained(template)?;
					self.skip_body(template)?;
					return Ok(node);
				}
				MemberSpec::AnyChildren => {
					self.read_children(template, &mut node)?;
					return Ok(node);
				}
				MemberSpec::Array { element, len } => {
					let count = self.array_len(template, &node, len)?;
					let value = match element {
						Element::Scalar(ScalarKind::Dword) => Value::IntArray((0..count).map(|_| self.next_int(template)).collect::<Result<_>>()?),
						Element::Scalar(ScalarKind::Float) => Value::FloatArray((0..count).map(|_| self.next_float(template)).collect::<Result<_>>()?),
						Element::Scalar(ScalarKind::String) => return Err(self.token_error(template, "string arrays are not supported")),
						Element::Record(name) => {
							let element = self.ctx.resolve(name);
							let mut items = Vec::with_capacity(count);
							for _ in 0..count {
								items.push(self.read(element.clone(), true)?);
							}
							Value::NodeArray(items)
						}
					};
					node.children.push(value);
				}
				MemberSpec::Scalar(ScalarKind::Dword) => {
					let value = self.next_int(template)?;
					node.children.push(Value::Int(value));
				}
				MemberSpec::Scalar(ScalarKind::Float) => {
					let value = self.next_float(template)?;
					node.children.push(Value::Float(value));
				}
				MemberSpec::Scalar(ScalarKind::String) => {
					let text = self.read_string(template)?;
					node.children.push(Value::String(text.into()));
				}
				MemberSpec::Nested(name) => {
					let nested = self.ctx.resolve(name);
					let child = self.read(nested, true)?;
					node.children.push(Value::Node(child));
				}
				MemberSpec::References => self.read_references(template, &mut node)?,
			}
		}

		if !inline {
			self.ensure_drained(template)?;
			self.expect(template, TOKEN_CBRACE, "expected closing brace")?;
		}
		Ok(node)
	}

	fn read_children(&mut self, template: &Template, node: &mut Node) -> Result<()> {
		loop {
			self.ensure_drained(template)?;
			if self.cursor.is_at_end() {
				if template.is_root() {
					return Ok(());
				}
				return Err(self.token_error(template, "unexpected end of payload before closing brace"));
			}

			match self.cursor.read_u16()? {
				TOKEN_NAME => {
					let name = self.read_record_header(template)?;
					self.ctx.tick()?;
					let nested = self.ctx.resolve(&name);
					let child = self.read(nested, false)?;
					if !is_folded(&name) {
						node.children.push(Value::Node(child));
					}
				}
				TOKEN_TEMPLATE => {
					self.expect(template, TOKEN_NAME, "expected template name")?;
					let name = format!("template {}", self.read_name_body(template)?);
					self.skip_until_open(template)?;
					self.skip_body(template)?;
					if !is_folded(&name) {
						node.children.push(Value::Node(Node::new(&name, None)));
					}
				}
				TOKEN_OBRACE => self.skip_reference(template)?,
				TOKEN_CBRACE if !template.is_root() => return Ok(()),
				TOKEN_CBRACE => return Err(self.token_error(template, "unexpected closing brace at file level")),
				TOKEN_SEMICOLON if template.name == "MeshMaterialList" => {}
				_ => return Err(self.token_error(template, "expected record name or closing brace")),
			}
		}
	}

	/// Material references encoded as `OBRACE NAME CBRACE` groups.
	fn read_references(&mut self, template: &Template, node: &mut Node) -> Result<()> {
		self.ensure_drained(template)?;
		while self.cursor.peek_u16() == Some(TOKEN_OBRACE) {
			self.cursor.read_u16()?;
			self.expect(template, TOKEN_NAME, "expected reference name")?;
			let name = self.read_name_body(template)?;
			if self.cursor.peek_u16() == Some(TOKEN_GUID) {
				self.cursor.read_u16()?;
				self.cursor.skip(GUID_BYTES)?;
			}
			self.expect(template, TOKEN_CBRACE, "expected closing brace after reference")?;
			node.children.push(Value::String(name.into()));
		}
		Ok(())
	}

	/// `NAME [NAME] [GUID] OBRACE` after the leading `NAME` token.
	fn read_record_header(&mut self, template: &Template) -> Result<String> {
		let mut name = self.read_name_body(template)?;
		if self.cursor.peek_u16() == Some(TOKEN_NAME) {
			self.cursor.read_u16()?;
			let label = self.read_name_body(template)?;
			name = format!("{name} {label}");
		}
		if self.cursor.peek_u16() == Some(TOKEN_GUID) {
			self.cursor.read_u16()?;
			self.cursor.skip(GUID_BYTES)?;
		}
		self.expect(template, TOKEN_OBRACE, "expected opening brace after record name")?;
		Ok(name)
	}

	fn read_name_body(&mut self, template: &Template) -> Result<String> {
		let len = self.cursor.read_u32()? as usize;
		if len == 0 {
			return Err(self.token_error(template, "empty name"));
		}
		let raw = self.cursor.read_exact(len)?;
		Ok(self.ctx.options().encoding.decode(raw).into_owned())
	}

	/// `STRING` token followed by its `;` or `,` terminator token.
	fn read_string(&mut self, template: &Template) -> Result<String> {
		self.ensure_drained(template)?;
		self.expect(template, TOKEN_STRING, "expected string")?;
		let len = self.cursor.read_u32()? as usize;
		let raw = self.cursor.read_exact(len)?;
		let text = self.ctx.options().encoding.decode(raw).trim_end_matches('\0').to_owned();
		match self.cursor.read_u16()? {
			TOKEN_SEMICOLON | TOKEN_COMMA => Ok(text),
			_ => Err(self.token_error(template, "expected separator after string")),
		}
	}

	fn next_int(&mut self, template: &Template) -> Result<i32> {
		if let Some(value) = self.ints.pop() {
			return Ok(value);
		}
		if !self.floats.is_empty() {
			return Err(self.token_error(template, "integer requested while a float list is pending"));
		}
		loop {
			match self.cursor.read_u16()? {
				TOKEN_INTEGER => return self.cursor.read_i32(),
				TOKEN_INTEGER_LIST => {
					let count = self.list_len()?;
					if count == 0 {
						continue;
					}
					let mut values = (0..count).map(|_| self.cursor.read_i32()).collect::<Result<Vec<_>>>()?;
					values.reverse();
					self.ints = values;
					if let Some(value) = self.ints.pop() {
						return Ok(value);
					}
				}
				_ => return Err(self.token_error(template, "expected integer or integer list")),
			}
		}
	}

	fn next_float(&mut self, template: &Template) -> Result<f64> {
		if let Some(value) = self.floats.pop() {
			return Ok(value);
		}
		if !self.ints.is_empty() {
			return Err(self.token_error(template, "float requested while an integer list is pending"));
		}
		loop {
			if self.cursor.read_u16()? != TOKEN_FLOAT_LIST {
				return Err(self.token_error(template, "expected float list"));
			}
			let count = self.list_len()?;
			if count == 0 {
				continue;
			}
			let mut values = Vec::with_capacity(count);
			for _ in 0..count {
				values.push(match self.width {
					FloatWidth::F32 => f64::from(self.cursor.read_f32()?),
					FloatWidth::F64 => self.cursor.read_f64()?,
				});
			}
			values.reverse();
			self.floats = values;
			if let Some(value) = self.floats.pop() {
				return Ok(value);
			}
		}
	}

	fn list_len(&mut self) -> Result<usize> {
		let count = self.cursor.read_u32()? as usize;
		self.ctx.check_array(count)
	}

	fn array_len(&self, template: &Template, node: &Node, len: ArrayLen) -> Result<usize> {
		let count = match len {
			ArrayLen::Fixed(count) => count,
			ArrayLen::Member(idx) => {
				let declared = node
					.children
					.get(idx)
					.and_then(Value::as_int)
					.ok_or_else(|| self.token_error(template, "array length does not refer to a DWORD member"))?;
				usize::try_from(declared).map_err(|_| self.token_error(template, "negative array length"))?
			}
		};
		self.ctx.check_array(count)
	}

	/// Skip a reference group after its opening brace.
	fn skip_reference(&mut self, template: &Template) -> Result<()> {
		loop {
			match self.cursor.read_u16()? {
				TOKEN_CBRACE => return Ok(()),
				TOKEN_NAME => {
					self.read_name_body(template)?;
				}
				TOKEN_GUID => self.cursor.skip(GUID_BYTES)?,
				_ => return Err(self.token_error(template, "unexpected token in reference")),
			}
		}
	}

	/// Skip the tokens between a template name and its opening brace.
	fn skip_until_open(&mut self, template: &Template) -> Result<()> {
		loop {
			match self.cursor.read_u16()? {
				TOKEN_OBRACE => return Ok(()),
				TOKEN_GUID => self.cursor.skip(GUID_BYTES)?,
				_ => return Err(self.token_error(template, "expected opening brace after template name")),
			}
		}
	}

	/// Skip tokens up to the brace closing the current record.
	fn skip_body(&mut self, template: &Template) -> Result<()> {
		let mut depth = 0_usize;
		loop {
			if self.cursor.is_at_end() {
				return Err(self.token_error(template, "unexpected end of payload in opaque record"));
			}
			match self.cursor.read_u16()? {
				TOKEN_OBRACE => depth += 1,
				TOKEN_CBRACE => {
					if depth == 0 {
						return Ok(());
					}
					depth -= 1;
				}
				TOKEN_NAME | TOKEN_STRING => {
					let len = self.cursor.read_u32()? as usize;
					self.cursor.skip(len)?;
				}
				TOKEN_INTEGER => self.cursor.skip(4)?,
				TOKEN_GUID => self.cursor.skip(GUID_BYTES)?,
				TOKEN_INTEGER_LIST => {
					let count = self.list_len()?;
					self.cursor.skip(count * 4)?;
				}
				TOKEN_FLOAT_LIST => {
					let count = self.list_len()?;
					self.cursor.skip(count * self.width.bytes())?;
				}
				12..=20 | 31 | 40..=55 => {}
				_ => return Err(self.token_error(template, "unknown token")),
			}
		}
	}

	fn ensure_drained(&self, template: &Template) -> Result<()> {
		if self.ints.is_empty() && self.floats.is_empty() {
			Ok(())
		} else {
			Err(self.token_error(template, "pending scalar list not fully consumed"))
		}
	}

	fn expect(&mut self, template: &Template, token: u16, reason: &'static str) -> Result<()> {
		if self.cursor.read_u16()? == token {
			Ok(())
		} else {
			Err(self.token_error(template, reason))
		}
	}

	fn token_error(&self, template: &Template, reason: &'static str) -> XofError {
		XofError::Token {
			at: XofHeader::SIZE + self.cursor.pos(),
			template: template.name.as_ref().into(),
			reason,
		}
	}
}
