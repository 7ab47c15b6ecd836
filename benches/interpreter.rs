//! End-to-end evaluation benchmarks through the `Runtime` API
//!
//! Run with: cargo bench --bench interpreter

#![allow(clippy::panic)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ecmavm::{Runtime, RuntimeConfig};

fn runtime() -> Runtime {
    match Runtime::with_config(RuntimeConfig::default().with_timeout_ms(60_000)) {
        Ok(runtime) => runtime,
        Err(err) => panic!("runtime creation failed: {}", err),
    }
}

fn run(runtime: &Runtime, source: &str) {
    if let Err(err) = runtime.eval(black_box(source)) {
        panic!("benchmark script failed: {}", err);
    }
}

const FIB: &str = "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(20);";

const ARRAY_PIPELINE: &str = r#"
const data = Array.from({ length: 2000 }, (_, i) => i);
data.filter((x) => x % 3 === 0).map((x) => x * 2).reduce((a, b) => a + b, 0);
"#;

const OBJECTS: &str = r#"
const points = [];
for (let i = 0; i < 2000; i++) points.push({ x: i, y: i * 2, label: 'p' + i });
let total = 0;
for (const { x, y } of points) total += x + y;
JSON.stringify(points.slice(0, 50));
"#;

const CLASSES: &str = r#"
class Vec2 {
    constructor(x, y) { this.x = x; this.y = y; }
    add(o) { return new Vec2(this.x + o.x, this.y + o.y); }
    get length() { return Math.hypot(this.x, this.y); }
}
let v = new Vec2(0, 0);
for (let i = 0; i < 2000; i++) v = v.add(new Vec2(1, 1));
v.length;
"#;

const GENERATORS: &str = r#"
function* range(n) { for (let i = 0; i < n; i++) yield i; }
let sum = 0;
for (const i of range(2000)) sum += i;
sum;
"#;

const PROMISES: &str = r#"
let settled = 0;
async function step(i) { await null; return i; }
for (let i = 0; i < 500; i++) step(i).then(() => { settled++; });
"#;

const STRINGS: &str = r#"
let s = '';
for (let i = 0; i < 1000; i++) s += String.fromCharCode(97 + (i % 26));
s.split('').reverse().join('').toUpperCase().indexOf('ZYX');
"#;

fn bench_workloads(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/workloads");
    for (name, source) in [
        ("fib_20", FIB),
        ("array_pipeline", ARRAY_PIPELINE),
        ("objects", OBJECTS),
        ("classes", CLASSES),
        ("generators", GENERATORS),
        ("promises", PROMISES),
        ("strings", STRINGS),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, s| {
            b.iter(|| {
                let runtime = runtime();
                run(&runtime, s);
            });
        });
    }
    group.finish();
}

fn bench_runtime_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/setup");
    group.bench_function("new_runtime", |b| b.iter(|| black_box(runtime())));
    group.bench_function("new_realm", |b| {
        let runtime = runtime();
        b.iter(|| black_box(runtime.create_realm(Default::default())));
    });
    group.finish();
}

fn bench_modules(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter/modules");
    group.bench_function("import_graph", |b| {
        b.iter(|| {
            let runtime = runtime();
            for i in 0..20 {
                let source = if i == 0 {
                    "export const value = 0;".to_string()
                } else {
                    format!("import {{ value as v }} from 'm{}'; export const value = v + 1;", i - 1)
                };
                runtime.add_module(&format!("m{}", i), &source);
            }
            black_box(runtime.eval_module("m19"))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_workloads, bench_runtime_setup, bench_modules);
criterion_main!(benches);
