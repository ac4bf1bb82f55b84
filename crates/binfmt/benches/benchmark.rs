use anyhow::Result;
use binfmt::{CustomSectionRegistry, Parser, DEFAULT_TABLE};
use criterion::{criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::{Path, PathBuf};

/// A benchmark input.
struct BenchmarkInput {
    path: PathBuf,
    wasm: Vec<u8>,
}

/// Collects every `.wasm` and `.wat` file under `path`.
fn collect_test_files(path: &Path, list: &mut Vec<BenchmarkInput>) -> Result<()> {
    for entry in path.read_dir()? {
        let path = entry?.path();
        if path.is_dir() {
            collect_test_files(&path, list)?;
            continue;
        }
        let wasm = match path.extension().and_then(|ext| ext.to_str()) {
            Some("wasm") => fs::read(&path)?,
            Some("wat") => match wat::parse_file(&path) {
                Ok(wasm) => wasm,
                Err(_) => continue,
            },
            _ => continue,
        };
        list.push(BenchmarkInput { path, wasm });
    }
    Ok(())
}

fn inputs() -> Result<Vec<BenchmarkInput>> {
    let mut list = Vec::new();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/cli");
    if dir.exists() {
        collect_test_files(&dir, &mut list)?;
    }

    // One larger module so the section loop dominates the header check.
    let mut wat = String::from("(module\n");
    for i in 0..1000 {
        wat.push_str(&format!("(func (export \"f{i}\") (result i32) i32.const {i})\n"));
    }
    wat.push(')');
    list.push(BenchmarkInput {
        path: PathBuf::from("generated.wat"),
        wasm: wat::parse_str(&wat)?,
    });
    Ok(list)
}

fn parse_benchmark(c: &mut Criterion) {
    let inputs = inputs().unwrap();
    let parser = Parser::new(&DEFAULT_TABLE, CustomSectionRegistry::builtin());
    c.bench_function("parse", |b| {
        b.iter(|| {
            for input in &inputs {
                if let Err(e) = parser.parse(&input.wasm) {
                    log::debug!("{}: {e}", input.path.display());
                }
            }
        })
    });
}

criterion_group!(benchmark, parse_benchmark);
criterion_main!(benchmark);
