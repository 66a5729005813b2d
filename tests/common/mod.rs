#![allow(dead_code)]

use std::path::{Path, PathBuf};

use miniz_oxide::deflate::compress_to_vec;

/// Resolve a fixture path under `<crate>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

/// Binary token writer for hand-built payloads with 32-bit floats.
#[derive(Default)]
pub struct Tokens(pub Vec<u8>);

impl Tokens {
	pub fn token(&mut self, code: u16) -> &mut Self {
		self.0.extend_from_slice(&code.to_le_bytes());
		self
	}

	pub fn name(&mut self, name: &str) -> &mut Self {
		self.token(1);
		self.0.extend_from_slice(&(name.len() as u32).to_le_bytes());
		self.0.extend_from_slice(name.as_bytes());
		self
	}

	pub fn ints(&mut self, values: &[i32]) -> &mut Self {
		self.token(6);
		self.0.extend_from_slice(&(values.len() as u32).to_le_bytes());
		for value in values {
			self.0.extend_from_slice(&value.to_le_bytes());
		}
		self
	}

	pub fn floats(&mut self, values: &[f32]) -> &mut Self {
		self.token(7);
		self.0.extend_from_slice(&(values.len() as u32).to_le_bytes());
		for value in values {
			self.0.extend_from_slice(&value.to_le_bytes());
		}
		self
	}

	pub fn open(&mut self) -> &mut Self {
		self.token(10)
	}

	pub fn close(&mut self) -> &mut Self {
		self.token(11)
	}

	/// Complete `bin ` file: header followed by the tokens written so far.
	pub fn into_file(self) -> Vec<u8> {
		let mut out = b"xof 0302bin 0032".to_vec();
		out.extend_from_slice(&self.0);
		out
	}
}

/// Binary equivalent of `fixtures/red_material.x`.
pub fn red_material_binary() -> Vec<u8> {
	let mut tokens = Tokens::default();
	tokens.name("Mesh").name("Triangle").open();
	tokens.ints(&[3]).floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).ints(&[1, 3, 0, 1, 2]);
	tokens.name("MeshMaterialList").open().ints(&[1, 1, 0]);
	tokens.name("Material").open().floats(&[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).close();
	tokens.close().close();
	tokens.into_file()
}

/// Wrap an uncompressed file into its MSZIP flavor (`tzip`/`bzip`).
pub fn mszip(file: &[u8]) -> Vec<u8> {
	let (header, payload) = file.split_at(16);
	let mut out = header.to_vec();
	let tag: &[u8; 4] = if &header[8..12] == b"txt " { b"tzip" } else { b"bzip" };
	out[8..12].copy_from_slice(tag);
	out.extend_from_slice(&(file.len() as u32).to_le_bytes());
	for chunk in payload.chunks(0x8000) {
		let deflated = compress_to_vec(chunk, 6);
		out.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
		out.extend_from_slice(&((deflated.len() + 2) as u16).to_le_bytes());
		out.extend_from_slice(b"CK");
		out.extend_from_slice(&deflated);
	}
	out
}
