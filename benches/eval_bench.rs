use criterion::{Criterion, black_box, criterion_group, criterion_main};
use minilisp::interp::Interpreter;
use minilisp::InterpreterConfig;

const FIB: &str = "(define fib (fun (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))";
const FACT: &str = "(define fact (fun (n) (if (< n 1) 1 (* n (fact (- n 1))))))";

fn interpreter_with(definitions: &str) -> Interpreter {
    let mut interpreter = Interpreter::with_config(InterpreterConfig::new().capturing_output());
    interpreter.run_program(definitions);
    interpreter
}

fn bench_parse(c: &mut Criterion) {
    let source = format!("{}\n{}\n(print-num (fib 20))\n(print-num (fact 20))", FIB, FACT);
    c.bench_function("parse", |b| b.iter(|| minilisp::parse(black_box(&source))));
}

fn bench_recursion(c: &mut Criterion) {
    let mut interpreter = interpreter_with(FIB);
    c.bench_function("fib 18", |b| {
        b.iter(|| interpreter.run_program(black_box("(fib 18)")))
    });

    let mut interpreter = interpreter_with(FACT);
    c.bench_function("fact 20", |b| {
        b.iter(|| interpreter.run_program(black_box("(fact 20)")))
    });
}

criterion_group!(benches, bench_parse, bench_recursion);
criterion_main!(benches);
