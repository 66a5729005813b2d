use std::path::PathBuf;

use xofdoc::xof::{DecodeContext, DecodeOptions, LogHost, Node, Result, Value, XofFile};

use crate::cmd::info::record_label;
use crate::cmd::util::truncate;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "max-depth", default_value_t = 8)]
	pub max_depth: u32,
	#[arg(long = "max-array", default_value_t = 8)]
	pub max_array: usize,
}

/// Output truncation limits for tree printing.
#[derive(Debug, Clone, Copy)]
struct Limits {
	max_depth: u32,
	max_array: usize,
}

const MAX_STRING_LEN: usize = 120;

/// Decode the file and print its record tree.
pub fn run(args: Args) -> Result<()> {
	let Args { path, max_depth, max_array } = args;

	let file = XofFile::open(&path)?;
	let options = DecodeOptions::default();
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(&options, &host).with_file(&path);
	let root = file.tree(&mut ctx)?;

	let limits = Limits { max_depth, max_array };
	for child in &root.children {
		print_value(child, 0, limits);
	}
	for item in ctx.diagnostics().items() {
		eprintln!("{}: {}", item.severity.as_str(), item.message);
	}
	Ok(())
}

fn print_node(node: &Node, depth: u32, limits: Limits) {
	println!("{}{}", indent(depth), record_label(node));
	if depth >= limits.max_depth {
		if !node.children.is_empty() {
			println!("{}...", indent(depth + 1));
		}
		return;
	}
	for child in &node.children {
		print_value(child, depth + 1, limits);
	}
}

fn print_value(value: &Value, depth: u32, limits: Limits) {
	let pad = indent(depth);
	match value {
		Value::Int(v) => println!("{pad}int {v}"),
		Value::Float(v) => println!("{pad}float {v}"),
		Value::String(v) => println!("{pad}string {:?}", truncate(v, MAX_STRING_LEN)),
		Value::IntArray(items) => println!("{pad}int[{}] {}", items.len(), render_items(items, limits.max_array)),
		Value::FloatArray(items) => println!("{pad}float[{}] {}", items.len(), render_items(items, limits.max_array)),
		Value::Node(node) => print_node(node, depth, limits),
		Value::NodeArray(items) => {
			println!("{pad}[{} records]", items.len());
			for item in items.iter().take(limits.max_array) {
				print_node(item, depth + 1, limits);
			}
			if items.len() > limits.max_array {
				println!("{}... {} more", indent(depth + 1), items.len() - limits.max_array);
			}
		}
	}
}

fn render_items<T: std::fmt::Display>(items: &[T], max: usize) -> String {
	let mut out: Vec<String> = items.iter().take(max).map(ToString::to_string).collect();
	if items.len() > max {
		out.push("...".to_owned());
	}
	format!("[{}]", out.join(", "))
}

fn indent(depth: u32) -> String {
	"  ".repeat(depth as usize)
}
