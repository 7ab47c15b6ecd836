//! Parser benchmarks
//!
//! Run with: cargo bench --bench parser

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ecmavm::parser::{parse_module, parse_script};
use ecmavm::string_dict::StringDict;

const FUNCTIONS: &str = r#"
function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
const add = (a, b = 0, ...rest) => a + b + rest.length;
async function load(items) {
    for await (const item of items) { await item; }
}
function* range(start, end) { for (let i = start; i < end; i++) yield i; }
"#;

const DESTRUCTURING: &str = r#"
const { a, b: { c, d = 1 }, ...rest } = source;
let [first, , third = 3, ...others] = list;
({ x: target.x, y = 2 } = point);
[a, b] = [b, a];
function f({ name, tags: [primary] = [] }, [head, ...tail]) { return name + primary + head; }
"#;

const CLASSES: &str = r#"
class Shape {
    static count = 0;
    static { Shape.registry = new Map(); }
    constructor(name) { this.name = name; Shape.count++; }
    get label() { return `<${this.name}>`; }
    area() { return 0; }
}
class Circle extends Shape {
    radius = 1;
    constructor(r) { super('circle'); this.radius = r; }
    area() { return Math.PI * this.radius ** 2 + super.area(); }
}
"#;

const TYPESCRIPT: &str = r#"
interface Point { x: number; y: number }
type Pair<T> = [T, T];
function distance(a: Point, b: Point): number {
    const dx: number = a.x - b.x;
    return Math.sqrt(dx * dx + (a.y - b.y) ** 2) as number;
}
class Box<T> implements Container<T> {
    private value!: T;
    constructor(public readonly label: string) {}
    get(): T { return this.value; }
}
"#;

const MODULE: &str = r#"
import base, { helper as h, other } from './base.js';
import * as utils from './utils.js';
export const value = h(base);
export function run() { return utils.start(other); }
export default class Runner {}
export { value as alias };
export * from './more.js';
"#;

fn generate_binary_expr(depth: usize) -> String {
    let mut expr = String::from("x");
    for i in 0..depth {
        expr = format!("({} + {} * y{})", expr, i, i);
    }
    expr.push(';');
    expr
}

fn generate_large_source(size: usize) -> String {
    let chunk = "function compute(a, b) { const { x, y } = a; return [x + y, ...b].map((v) => v * 2); }\nclass Item { constructor(v) { this.v = v; } get double() { return this.v * 2; } }\n";
    chunk.repeat(size / chunk.len() + 1)
}

fn bench_parser_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/individual");
    for (name, source) in [
        ("functions", FUNCTIONS),
        ("destructuring", DESTRUCTURING),
        ("classes", CLASSES),
        ("typescript", TYPESCRIPT),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            let mut dict = StringDict::new();
            b.iter(|| black_box(parse_script(black_box(s), &mut dict)));
        });
    }
    group.bench_function("module", |b| {
        let mut dict = StringDict::new();
        b.iter(|| black_box(parse_module(black_box(MODULE), &mut dict)));
    });
    group.finish();
}

fn bench_parser_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/throughput");
    for size in [1_000, 10_000, 100_000] {
        let source = generate_large_source(size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", source.len() / 1024)),
            &source,
            |b, s| {
                let mut dict = StringDict::new();
                b.iter(|| black_box(parse_script(black_box(s), &mut dict)));
            },
        );
    }
    group.finish();
}

fn bench_parser_expression_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/expression_depth");
    for depth in [10, 50, 100] {
        let source = generate_binary_expr(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &source, |b, s| {
            let mut dict = StringDict::new();
            b.iter(|| black_box(parse_script(black_box(s), &mut dict)));
        });
    }
    group.finish();
}

fn bench_parser_arrow_backtracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/arrow_backtracking");
    // Parenthesized expressions force a speculative arrow parse first.
    let parenthesized = "(a, b, (c, d), (e + f)) * 2;\n".repeat(200);
    let arrows = "const f = (a, b, { c, d }, [e, f]) => a;\n".repeat(200);
    group.bench_function("parenthesized", |b| {
        let mut dict = StringDict::new();
        b.iter(|| black_box(parse_script(black_box(&parenthesized), &mut dict)));
    });
    group.bench_function("arrows", |b| {
        let mut dict = StringDict::new();
        b.iter(|| black_box(parse_script(black_box(&arrows), &mut dict)));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parser_individual,
    bench_parser_throughput,
    bench_parser_expression_depth,
    bench_parser_arrow_backtracking,
);
criterion_main!(benches);
