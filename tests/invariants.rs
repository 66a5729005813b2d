#![allow(missing_docs)]

mod common;

use common::{fixture_path, red_material_binary};
use xofdoc::xof::{DecodeOptions, LogHost, Mesh, Source, decode};

const FIXTURES: &[&str] = &["triangle.x", "red_material.x", "vertex_colors.x", "cube.x"];

fn check_ranges(name: &str, mesh: &Mesh) {
	for face in &mesh.faces {
		assert!((face.material as usize) < mesh.materials.len(), "{name}: face material out of range");
		for corner in &face.vertices {
			assert!((corner.index as usize) < mesh.vertices.len(), "{name}: corner index out of range");
		}
	}
	for material in &mesh.materials {
		let channels = material.base_color.iter().chain(&material.specular_color).chain(&material.emissive_color);
		for channel in channels {
			assert!((0.0..=1.0).contains(channel), "{name}: channel {channel} outside [0, 1]");
		}
	}
}

#[test]
fn decoding_twice_gives_identical_results() {
	for name in FIXTURES {
		let options = DecodeOptions::default();
		let first = decode(Source::Path(fixture_path(name)), &options, &LogHost::new());
		let second = decode(Source::Path(fixture_path(name)), &options, &LogHost::new());
		assert_eq!(first.diagnostics, second.diagnostics, "{name}");
		assert_eq!(first.mesh.ok(), second.mesh.ok(), "{name}");
	}
}

#[test]
fn decoded_meshes_stay_in_range() {
	for name in FIXTURES {
		let report = decode(Source::Path(fixture_path(name)), &DecodeOptions::default(), &LogHost::new());
		let mesh = report.mesh.unwrap_or_else(|err| panic!("{name}: {err}"));
		check_ranges(name, &mesh);
	}

	let source = Source::Bytes {
		name: fixture_path("red_material.x"),
		bytes: red_material_binary(),
	};
	let report = decode(source, &DecodeOptions::default(), &LogHost::new());
	let mesh = report.mesh.unwrap_or_else(|err| panic!("binary: {err}"));
	check_ranges("binary", &mesh);
}

#[test]
fn cancelled_host_stops_without_diagnostic() {
	let host = LogHost::new();
	host.cancel();
	let report = decode(Source::Path(fixture_path("cube.x")), &DecodeOptions::default(), &host);
	assert!(matches!(report.mesh, Err(xofdoc::xof::XofError::Cancelled)));
	assert!(report.diagnostics.is_empty());
}
