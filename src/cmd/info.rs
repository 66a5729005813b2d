use std::path::PathBuf;

use serde::Serialize;
use xofdoc::xof::{DecodeContext, DecodeOptions, LogHost, Node, Result, Value, XofFile};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

#[derive(Serialize)]
struct InfoJson {
	path: String,
	version: Option<u16>,
	encoding: &'static str,
	compressed: bool,
	float_bits: u32,
	payload_bytes: usize,
	records: Vec<String>,
}

/// Print header fields and the top-level record names.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let file = XofFile::open(&path)?;
	let options = DecodeOptions::default();
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(&options, &host).with_file(&path);
	let root = file.tree(&mut ctx)?;
	let records: Vec<String> = root.children.iter().filter_map(Value::as_node).map(record_label).collect();

	if json {
		emit_json(&InfoJson {
			path: path.display().to_string(),
			version: file.header.version,
			encoding: file.header.encoding.as_str(),
			compressed: file.is_compressed(),
			float_bits: file.header.float_width.bits(),
			payload_bytes: file.payload().len(),
			records,
		});
		return Ok(());
	}

	println!("path: {}", path.display());
	match file.header.version {
		Some(version) => println!("version: {version}"),
		None => println!("version: unknown"),
	}
	println!("encoding: {}", file.header.encoding.as_str());
	println!("compressed: {}", file.is_compressed());
	println!("float_bits: {}", file.header.float_width.bits());
	println!("payload_bytes: {}", file.payload().len());
	println!("records:");
	for record in records {
		println!("  {record}");
	}
	Ok(())
}

pub(crate) fn record_label(node: &Node) -> String {
	match &node.key {
		Some(key) => format!("{} {key}", node.name),
		None => node.name.to_string(),
	}
}
