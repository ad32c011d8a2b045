use std::fs;
use std::path::Path;

use clap::Parser;

use h2layout::cli::Cli;
use h2layout::error::{HeaderError, Warning};
use h2layout::processor::{ParseContext, ParseOutcome};
use h2layout::runtime::{Endianness, Record, Value};
use h2layout::source::SearchPath;
use h2layout::writer::{ManifestWriter, native};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/sample.h");

fn context(search: SearchPath) -> ParseContext<'static> {
    ParseContext::new(
        Box::new(ManifestWriter::new(Box::new(std::io::sink()))),
        search,
        Endianness::Little,
    )
}

fn parse_sample() -> ParseOutcome {
    let mut ctx = context(SearchPath::default());
    ctx.parse_file(Path::new(SAMPLE)).expect("sample parses");
    ctx.finish().unwrap()
}

fn parse_str(src: &str) -> Result<ParseOutcome, HeaderError> {
    let mut ctx = context(SearchPath::default());
    ctx.parse_str(src)?;
    ctx.finish()
}

fn creature(out: &ParseOutcome) -> Record {
    let mut point = Record::new(&out.types, "Point", Endianness::Little).unwrap();
    point.set("x", Value::Int(-7)).unwrap();
    point.set("y", Value::Int(1200)).unwrap();

    let mut c = Record::new(&out.types, "Creature", Endianness::Little).unwrap();
    c.set(
        "path",
        Value::Array(vec![
            Value::Record(point.clone()),
            Value::Record(Record::new(&out.types, "Point", Endianness::Little).unwrap()),
            Value::Record(point),
        ]),
    )
    .unwrap();
    c.set("id", Value::UInt(42)).unwrap();
    c.set("name", Value::text("Zorp")).unwrap();
    c.set("stats", Value::Array((1..=6).map(Value::UInt).collect())).unwrap();
    c.set("active", Value::Bool(true)).unwrap();
    c
}

#[test]
fn int_then_float_pair_is_twelve_bytes() {
    let out = parse_sample();
    let s = out.types.get_struct("S").unwrap();
    assert_eq!(s.layout.packed_size, 12);
    assert_eq!(s.layout.format_string(), "<iff");
    let order: Vec<_> = s.layout.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn defines_and_macros_size_arrays() {
    let out = parse_sample();
    let c = out.types.get_struct("Creature").unwrap();
    let dims: Vec<_> = c
        .descriptor
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.dimensions.clone()))
        .collect();
    assert_eq!(
        dims,
        vec![
            ("path", vec![3]),
            ("id", vec![]),
            ("name", vec![8]),
            ("stats", vec![6]),
            ("active", vec![]),
        ]
    );
}

#[test]
fn nested_sizes_are_additive() {
    let out = parse_sample();
    let point = out.types.get_struct("Point").unwrap().layout.packed_size;
    let c = out.types.get_struct("Creature").unwrap();
    assert_eq!(point, 4);
    assert_eq!(c.layout.packed_size, 4 + 8 + 6 + 1 + 3 * point);
    assert_eq!(c.layout.format_string(), "<I8sBBBBBB?");
    // The tag resolves to the same struct.
    assert_eq!(out.types.get_struct("creature"), Some(c));
}

#[test]
fn comments_attach_in_order() {
    let out = parse_sample();
    let point = out.types.get_struct("Point").unwrap();
    assert_eq!(point.descriptor.doc_comment, "A 2-D position.");
    let comments: Vec<_> = point.descriptor.fields.iter().map(|f| f.comment.as_str()).collect();
    assert_eq!(comments, vec!["east", "north"]);
    assert_eq!(
        out.types.get_struct("S").unwrap().descriptor.doc_comment,
        "Two floats after an int."
    );
}

#[test]
fn unrecognised_lines_are_warnings() {
    let out = parse_sample();
    let skipped: Vec<_> = out
        .diagnostics
        .warnings()
        .filter_map(|w| match w {
            Warning::SkippedLine { line, text } => Some((*line, text.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![(1, "#pragma once".to_string())]);
}

#[test]
fn forward_reference_is_fatal() {
    let err = parse_str("struct A { B inner; };\nstruct B { int32_t x; };\n").unwrap_err();
    assert!(matches!(
        err.root(),
        HeaderError::UnresolvedType { type_name, line: 1 } if type_name == "B"
    ));
}

#[test]
fn reordering_changes_bytes_not_size() {
    let out = parse_str("struct P { uint8_t a; uint16_t b; };\nstruct Q { uint16_t b; uint8_t a; };\n").unwrap();
    let mut images = Vec::new();
    for name in ["P", "Q"] {
        let mut r = Record::new(&out.types, name, Endianness::Little).unwrap();
        r.set("a", Value::UInt(1)).unwrap();
        r.set("b", Value::UInt(0x0203)).unwrap();
        images.push(r.serialize().unwrap());
    }
    assert_eq!(images[0], vec![1, 3, 2]);
    assert_eq!(images[1], vec![3, 2, 1]);
}

#[test]
fn records_round_trip() {
    let out = parse_sample();
    let original = creature(&out);
    let bytes = original.serialize().unwrap();
    assert_eq!(bytes.len(), original.packed_size());

    let mut copy = Record::new(&out.types, "Creature", Endianness::Little).unwrap();
    copy.deserialize(&bytes).unwrap();
    assert_eq!(copy, original);
}

#[test]
fn byte_order_changes_bytes_not_size() {
    let out = parse_sample();
    let mut c = creature(&out);
    let little = c.serialize().unwrap();
    c.set_endianness(Endianness::Big);
    let big = c.serialize().unwrap();
    assert_eq!(little.len(), big.len());
    assert_ne!(little, big);
    assert_eq!(&little[12..16], &[42, 0, 0, 0]);
    assert_eq!(&big[12..16], &[0, 0, 0, 42]);
}

#[test]
fn composable_and_native_images_match() {
    let out = parse_sample();
    let c = creature(&out);
    assert_eq!(native::pack_image(&c, &out.types).unwrap(), c.serialize().unwrap());
}

#[test]
fn update_reports_changed_fields() {
    let out = parse_sample();
    let mut mine = creature(&out);
    let mut theirs = mine.clone();
    theirs.set("id", Value::UInt(43)).unwrap();
    let mut point = Record::new(&out.types, "Point", Endianness::Little).unwrap();
    point.set("x", Value::Int(5)).unwrap();
    let mut path = match theirs.get("path") {
        Some(Value::Array(items)) => items.clone(),
        other => panic!("unexpected path value {other:?}"),
    };
    path[1] = Value::Record(point);
    theirs.set("path", Value::Array(path)).unwrap();

    let report = mine.update_from(&theirs).unwrap();
    assert!(report.updated());
    assert_eq!(report.field("id"), Some(true));
    assert_eq!(report.field("path"), Some(true));
    assert_eq!(report.field("name"), Some(false));
    let paths: Vec<_> = report.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["path[1].x", "id"]);
    assert_eq!(mine, theirs);

    let again = mine.update_from(&theirs).unwrap();
    assert!(!again.updated());
}

#[test]
fn includes_resolve_once() {
    let dir = tempfile::tempdir().unwrap();
    let sys = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.h"),
        "#include \"point.h\"\n#include \"point.h\"\n#include <limits.h>\n#include <missing.h>\nstruct Line { Point_t a; Point_t b; uint8_t width[MAX_WIDTH]; };\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("point.h"),
        "typedef struct { int32_t x; int32_t y; } Point_t;\n",
    )
    .unwrap();
    fs::write(sys.path().join("limits.h"), "#define MAX_WIDTH 2\n").unwrap();

    let mut ctx = context(SearchPath::new(vec![sys.path().to_path_buf()]));
    ctx.parse_file(&dir.path().join("main.h")).unwrap();
    let out = ctx.finish().unwrap();

    assert_eq!(out.types.get_struct("Line").unwrap().layout.packed_size, 18);
    let unresolved: Vec<_> = out
        .diagnostics
        .warnings()
        .filter_map(|w| match w {
            Warning::UnresolvedInclude { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(unresolved, vec!["missing.h"]);
}

#[test]
fn errors_in_included_files_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.h"), "#include \"bad.h\"\n").unwrap();
    fs::write(dir.path().join("bad.h"), "\nstruct Bad { nope_t x; };\n").unwrap();

    let mut ctx = context(SearchPath::default());
    let err = ctx.parse_file(&dir.path().join("main.h")).unwrap_err();
    let mut chain = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        chain.push_str(&format!(": {inner}"));
        source = inner.source();
    }
    assert!(chain.contains("main.h") && chain.contains("bad.h"), "{chain}");
    assert_eq!(chain.matches("bad.h").count(), 1, "{chain}");
    assert_eq!(err.line(), Some(2));
}

fn generate(strategy: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    let args = Cli::parse_from([
        "h2layout",
        SAMPLE,
        "-o",
        output.to_str().unwrap(),
        "--strategy",
        strategy,
        "--endian",
        "little",
        "--no-env-include",
    ]);
    h2layout::run(&args).unwrap();
    fs::read_to_string(output).unwrap()
}

#[test]
fn composable_output_declares_everything() {
    let text = generate("composable");
    assert!(text.starts_with("// Auto-generated by h2layout - DO NOT EDIT"));
    for expected in [
        "pub const N: i64 = 3;",
        "macro_rules! SCALE",
        "(($arg) * 2)",
        "/// A 2-D position.",
        "pub struct Point {",
        "    /// east",
        "pub struct Creature {",
        "pub path: [Point; 3],",
        "pub name: [u8; 8],",
        "pub type creature = Creature;",
        "pub type level_t = u16;",
        "pub const FORMAT: &'static str = \"<I8sBBBBBB?\";",
        "impl PackedStruct for Creature {",
        "pub fn update_fields(&mut self, other: &Self) -> UpdateReport {",
    ] {
        assert!(text.contains(expected), "missing {expected:?}");
    }
}

#[test]
fn native_output_has_fixed_offsets() {
    let text = generate("native");
    for expected in [
        "pub const ENDIANNESS: Endianness = Endianness::Little;",
        "pub const OFFSET_path: usize = 0;",
        "pub const OFFSET_id: usize = 12;",
        "pub const OFFSET_active: usize = 30;",
        "(\"path[2].y\", 10, \"h\"),",
    ] {
        assert!(text.contains(expected), "missing {expected:?}");
    }
}

#[test]
fn manifest_output_is_json() {
    let json: serde_json::Value = serde_json::from_str(&generate("manifest")).unwrap();
    let names: Vec<_> = json["structs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Point", "S", "Creature"]);
    assert_eq!(json["constants"]["NAME_LEN"]["value"], 8);
}
