//! Inspects an OpenPrintTag image read from disk.
//!
//! Usage: `cargo run --example decode_tag -- <image.bin> [--no-cc]`

use std::fs;

use open_print_tag::{DecodeOptions, FieldValue, Region, Tag, Value};

fn print_region<R: Region>(region: &R) {
    println!("\n=== {} region ===", R::KIND);
    for (descriptor, value) in region.present_fields() {
        let text = match &value {
            FieldValue::Text(s) => format!("\"{}\"", s),
            other => other.to_string(),
        };
        println!("  {:<32} {}", descriptor.name, text);
    }
    for (key, value) in region.unknowns().iter() {
        println!("  {:<32} {}", format!("unknown {}", key), format_value(value));
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::Text(s) => format!("\"{}\"", s),
        Value::Bytes(b) => format!("BYTES[{}]", b.len()),
        Value::Array(items) => format!("ARRAY[{}]", items.len()),
        Value::Map(entries) => format!("MAP[{}]", entries.len()),
        Value::Tagged(tag, _) => format!("TAG({})", tag),
        other => format!("{:?}", other),
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "tag.bin".to_string());
    let options = if args.any(|arg| arg == "--no-cc") {
        DecodeOptions::new().without_capability_container()
    } else {
        DecodeOptions::new()
    };

    println!("Reading: {}", path);
    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let mut tag = Tag::decode_with_options(&data, options).expect("Failed to decode");
    if let Some(uri) = tag.uri() {
        println!("URI: {}", uri);
    }

    print_region(tag.meta());
    print_region(tag.main());
    if let Some(aux) = tag.aux() {
        print_region(aux);
    }

    let uuids = tag.derived_uuids();
    println!("\n=== UUIDs ===");
    for (name, uuid) in [
        ("brand", uuids.brand),
        ("material", uuids.material),
        ("package", uuids.package),
        ("instance", uuids.instance),
    ] {
        if let Some(uuid) = uuid {
            println!("  {:<10} {}", name, uuid);
        }
    }

    let mut report = tag.validate();
    report.extend(tag.opt_check());
    println!("\n=== Findings ===");
    for error in &report.errors {
        println!("  error:   {}", error);
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    // Re-encoding fills in the layout statistics.
    let encode_options = if options.capability_container {
        open_print_tag::EncodeOptions::new()
    } else {
        open_print_tag::EncodeOptions::new().without_capability_container()
    };
    match tag.encode_with_options(encode_options) {
        Ok(_) => {
            if let Some(stats) = tag.stats() {
                println!("\n=== Stats ===\n{}", stats);
            }
        }
        Err(e) => println!("\nRe-encode failed: {}", e),
    }
}
