/// One decoded member of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// `DWORD` scalar.
	Int(i32),
	/// `float` scalar.
	Float(f64),
	/// Quoted string, material reference, or scalar text that failed to parse.
	String(Box<str>),
	/// `DWORD` array.
	IntArray(Vec<i32>),
	/// `float` array.
	FloatArray(Vec<f64>),
	/// Nested record (inline member or named child).
	Node(Node),
	/// Array of inline records.
	NodeArray(Vec<Node>),
}

impl Value {
	/// Short kind label used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::IntArray(_) => "int[]",
			Self::FloatArray(_) => "float[]",
			Self::Node(_) => "record",
			Self::NodeArray(_) => "record[]",
		}
	}

	/// Integer payload, if this is an `Int`.
	pub fn as_int(&self) -> Option<i32> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Float payload, if this is a `Float`.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Nested record, if this is a `Node`.
	pub fn as_node(&self) -> Option<&Node> {
		match self {
			Self::Node(v) => Some(v),
			_ => None,
		}
	}
}

/// Generic decoded record, produced identically by the textual and binary decoders.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
	/// Canonical template name (or the raw name for unknown templates).
	pub name: Box<str>,
	/// Label of a named material declaration.
	pub key: Option<Box<str>>,
	/// Members in template order, followed by open-ended children.
	pub children: Vec<Value>,
}

impl Node {
	/// Create an empty record.
	pub fn new(name: &str, key: Option<&str>) -> Self {
		Self {
			name: name.into(),
			key: key.map(Into::into),
			children: Vec::new(),
		}
	}

	/// Record structure without payload values: `(name, key, child kinds)` recursively.
	///
	/// Two trees with equal shapes came from equivalent content regardless of
	/// which encoding produced them.
	pub fn shape(&self) -> String {
		let mut out = String::new();
		write_shape(self, &mut out);
		out
	}
}

fn write_shape(node: &Node, out: &mut String) {
	out.push_str(&node.name);
	if let Some(key) = &node.key {
		out.push('#');
		out.push_str(key);
	}
	out.push('(');
	for (idx, child) in node.children.iter().enumerate() {
		if idx > 0 {
			out.push(',');
		}
		match child {
			Value::Node(item) => write_shape(item, out),
			Value::NodeArray(items) => {
				out.push('[');
				for (item_idx, item) in items.iter().enumerate() {
					if item_idx > 0 {
						out.push(',');
					}
					write_shape(item, out);
				}
				out.push(']');
			}
			Value::IntArray(items) => out.push_str(&format!("int[{}]", items.len())),
			Value::FloatArray(items) => out.push_str(&format!("float[{}]", items.len())),
			other => out.push_str(other.kind()),
		}
	}
	out.push(')');
}
