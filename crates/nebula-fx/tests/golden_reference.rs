//! End-to-end reference frame.
//!
//! Seed 42, 8x8, t = 0, 4 octaves, lacunarity 2.0, persistence 0.5,
//! zspeed 0.15. The packed pixels are stored as hex under `tests/golden/`
//! and compared exactly. Run with `BLESS=1` to rewrite it after an
//! intentional change to the image; a missing file is a failure.

use std::fs;
use std::path::PathBuf;

use nebula_core::Config;
use nebula_fx::NebulaFx;
use nebula_render::{PixelBuffer, PixelSource};

const GOLDEN_NAME: &str = "nebula_seed42_8x8_t0.pixels";

/// Top row of the reference frame, kept inline so a regenerated golden file
/// cannot silently move the image.
const FIRST_ROW: [u32; 8] = [
    0xff52_804a,
    0xff64_8444,
    0xff5c_8246,
    0xff4b_7f4f,
    0xff58_8246,
    0xff4e_7f4a,
    0xff39_7d65,
    0xff58_7f49,
];

fn golden_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("golden")
        .join(GOLDEN_NAME)
}

fn is_bless_mode() -> bool {
    std::env::var("BLESS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn reference_config() -> Config {
    Config {
        width: 8,
        height: 8,
        octaves: 4,
        lacunarity: 2.0,
        persistence: 0.5,
        zspeed: 0.15,
        seed: 42,
        ..Config::default()
    }
}

fn render_reference() -> PixelBuffer {
    let config = reference_config();
    let fx = NebulaFx::new(&config);
    let mut buf = PixelBuffer::new(config.width, config.height);
    let width = config.width as usize;
    for (i, px) in buf.pixels_mut().iter_mut().enumerate() {
        *px = fx.sample((i % width) as u32, (i / width) as u32, 0.0);
    }
    buf
}

fn encode(buf: &PixelBuffer) -> String {
    let mut out = String::from("# ARGB8888, row-major, one row per line\n");
    for y in 0..buf.height() {
        let row: Vec<String> = buf.row(y).iter().map(|px| format!("{:08x}", px.0)).collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

fn decode(text: &str) -> Vec<u32> {
    text.lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .flat_map(|l| l.split_whitespace())
        .map(|word| u32::from_str_radix(word, 16).expect("hex pixel"))
        .collect()
}

#[test]
fn reference_frame_matches_golden() {
    let buf = render_reference();
    assert_eq!(buf.len(), 64);
    assert!(buf.pixels().iter().all(|px| px.is_opaque()));

    let path = golden_path();
    if is_bless_mode() {
        fs::create_dir_all(path.parent().expect("golden dir")).expect("create golden dir");
        fs::write(&path, encode(&buf)).expect("write golden");
        eprintln!("blessed golden frame at {}", path.display());
        return;
    }

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => panic!(
            "\n\
             === No golden frame found: '{GOLDEN_NAME}' ===\n\
             Expected at: {}\n\
             Run with BLESS=1 to create it.\n\n\
             Actual output (8x8):\n{}",
            path.display(),
            encode(&buf)
        ),
        Err(e) => panic!("failed to read golden '{}': {e}", path.display()),
    };
    let expected = decode(&text);
    let actual: Vec<u32> = buf.pixels().iter().map(|px| px.0).collect();
    assert_eq!(expected.len(), actual.len(), "golden pixel count");
    for (i, (e, a)) in expected.iter().zip(&actual).enumerate() {
        assert_eq!(
            e,
            a,
            "pixel ({}, {}) expected {e:08x} got {a:08x}",
            i % 8,
            i / 8
        );
    }
}

#[test]
fn reference_first_row_is_pinned() {
    let buf = render_reference();
    let row: Vec<u32> = buf.row(0).iter().map(|px| px.0).collect();
    assert_eq!(row, FIRST_ROW);
}

#[test]
fn reference_frame_is_reproducible() {
    let a = render_reference();
    let b = render_reference();
    assert_eq!(a, b);
    assert_eq!(a.checksum(), b.checksum());
}
