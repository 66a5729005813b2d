#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "xofdoc", about = "DirectX .x model inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print header, encoding and top-level record names.
	Info(cmd::info::Args),
	/// Print the decoded record tree.
	Tree(cmd::tree::Args),
	/// Decode to a mesh and print a summary or JSON.
	Mesh(cmd::mesh::Args),
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> xofdoc::xof::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Tree(args) => cmd::tree::run(args),
		Commands::Mesh(args) => cmd::mesh::run(args),
	}
}
