//! Benchmarks for parsing and merging.
//!
//! Run with: cargo bench -p gcodepin-gcode

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gcodepin_gcode::{merge, serialize, GcodeLine, GcodeParser, LayerBlocks, MergeOptions};

/// Synthetic sliced program with `layers` layers of `moves` extrusion moves each
fn synthetic_program(layers: u32, moves: u32) -> String {
    let mut text = String::from("; EXECUTABLE_BLOCK_START\nM83\n");
    for layer in 1..=layers {
        let z = layer as f64 * 0.2;
        text.push_str(&format!(";LAYER_CHANGE\n;Z:{:.1}\nG1 Z{:.1} F720\n", z, z));
        for i in 0..moves {
            text.push_str(&format!("G1 X{} Y{} E0.0421\n", i % 200, (i * 7) % 200));
        }
    }
    text.push_str("; EXECUTABLE_BLOCK_END\n");
    text
}

fn pin_blocks(layers: u32) -> LayerBlocks {
    let mut blocks = LayerBlocks::new();
    for layer in (8..=layers).step_by(8) {
        blocks.insert(
            layer,
            (0..40)
                .map(|i| GcodeLine::new("G1").with('Z', i as f64 * 0.2).with('E', 0.147))
                .collect(),
        );
    }
    blocks
}

fn bench_parse(c: &mut Criterion) {
    let text = synthetic_program(200, 500);
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("z_height", |b| {
        b.iter(|| GcodeParser::new(0.2).parse(black_box(&text)))
    });
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let text = synthetic_program(200, 500);
    let doc = GcodeParser::new(0.2).parse(&text);
    let blocks = pin_blocks(200);
    let options = MergeOptions::default();

    c.bench_function("merge_and_serialize", |b| {
        b.iter(|| {
            let merged = merge(black_box(&doc), black_box(&blocks), &options).unwrap();
            serialize(&merged)
        })
    });
}

criterion_group!(benches, bench_parse, bench_merge);
criterion_main!(benches);
