//! Tests for `define`, including self-reference and local definitions

use minilisp::interp::{Interpreter, Value};
use minilisp::{InterpreterConfig, LispError, StatementResult};

struct Run {
    results: Vec<StatementResult>,
    output: Vec<String>,
}

fn run(source: &str) -> Run {
    let mut interpreter = Interpreter::with_config(InterpreterConfig::new().capturing_output());
    let results = interpreter.run_program(source);
    let output = interpreter.output_mut().take_captured();
    Run { results, output }
}

fn last(source: &str) -> StatementResult {
    run(source)
        .results
        .pop()
        .expect("program should have a statement")
}

#[test]
fn test_recursive_factorial() {
    let source = "
        (define fact (fun (n) (if (< n 1) 1 (* n (fact (- n 1))))))
        (print-num (fact 5))
        (fact 10)
    ";
    let run = run(source);
    assert_eq!(run.output, ["120"]);
    assert_eq!(run.results[2], Ok(Some(Value::Int(3628800))));
}

#[test]
fn test_recursive_fibonacci() {
    let source = "
        (define fib (fun (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))
        (fib 15)
    ";
    assert_eq!(last(source), Ok(Some(Value::Int(610))));
}

#[test]
fn test_recursion_inside_local_define() {
    let source = "
        (define sum-to (fun (n)
            (define go (fun (i acc) (if (> i n) acc (go (+ i 1) (+ acc i)))))
            (go 1 0)))
        (sum-to 10)
    ";
    // `n` is not visible to `go`: local defines are evaluated when the `fun` is created
    assert!(matches!(
        last(source),
        Err(LispError::UndefinedVariable { ref name, .. }) if name == "n"
    ));

    let source = "
        (define count-down (fun (n)
            (define go (fun (i acc) (if (< i 1) acc (go (- i 1) (+ acc i)))))
            (go n 0)))
        (count-down 10)
    ";
    assert_eq!(last(source), Ok(Some(Value::Int(55))));
}

#[test]
fn test_calling_self_during_definition() {
    insta::assert_snapshot!(
        last("(define x (x))").unwrap_err().to_string(),
        @"calling an incomplete function: x"
    );
}

#[test]
fn test_self_reference_in_non_function_value() {
    assert!(matches!(
        last("(define x (+ x 1))"),
        Err(LispError::UndefinedVariable { ref name, .. }) if name == "x"
    ));
}

#[test]
fn test_redefine_in_terms_of_previous_value() {
    assert_eq!(
        last("(define x 1) (define x (+ x 1)) x"),
        Ok(Some(Value::Int(2)))
    );
}

#[test]
fn test_failed_define_keeps_previous_binding() {
    let run = run("(define x 1) (define x (+ x #t)) x");
    assert!(run.results[1].is_err());
    assert_eq!(run.results[2], Ok(Some(Value::Int(1))));
}

#[test]
fn test_defined_function_takes_its_name() {
    let result = last("(define double (fun (n) (* n 2))) double");
    match result {
        Ok(Some(Value::Function(f))) => {
            assert_eq!(f.name(), "double");
            assert!(!f.is_locked());
        }
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_alias_keeps_original_name() {
    let result = last("(define double (fun (n) (* n 2))) (define twice double) twice");
    match result {
        Ok(Some(Value::Function(f))) => assert_eq!(f.name(), "double"),
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn test_trial_output_printed_once() {
    let function = run("(define f (fun (x) (define seen (print-bool #t)) x)) (f 7)");
    assert_eq!(function.output, ["#t"]);
    assert_eq!(function.results[1], Ok(Some(Value::Int(7))));

    // A non-function value is evaluated again outside the trial
    let number = run("(define n (print-num 3)) n");
    assert_eq!(number.output, ["3"]);
    assert_eq!(number.results[1], Ok(None));
}

#[test]
fn test_mutual_recursion_through_globals() {
    let source = "
        (define is-even (fun (n) (if (= n 0) #t (is-odd (- n 1)))))
        (define is-odd (fun (n) (if (= n 0) #f (is-even (- n 1)))))
        (is-even 10)
        (is-odd 7)
    ";
    let run = run(source);
    assert_eq!(run.results[2], Ok(Some(Value::Bool(true))));
    assert_eq!(run.results[3], Ok(Some(Value::Bool(true))));
}

#[test]
fn test_forward_reference_fails_until_defined() {
    let source = "
        (define f (fun () (g)))
        (f)
        (define g (fun () 5))
        (f)
    ";
    let run = run(source);
    assert!(matches!(
        run.results[1],
        Err(LispError::UndefinedFunction { ref name, .. }) if name == "g"
    ));
    assert_eq!(run.results[3], Ok(Some(Value::Int(5))));
}

#[test]
fn test_local_defines_are_private() {
    let source = "
        (define f (fun (x) (define secret 42) (+ x secret)))
        (f 1)
        secret
    ";
    let run = run(source);
    assert_eq!(run.results[1], Ok(Some(Value::Int(43))));
    assert!(matches!(
        run.results[2],
        Err(LispError::UndefinedVariable { .. })
    ));
}

#[test]
fn test_local_defines_evaluated_once_per_closure() {
    let source = "
        (define make (fun (k) (fun (x) (define v (print-num 9)) (+ x 1))))
        (define g (make 0))
        (g 1)
        (g 2)
    ";
    let run = run(source);
    assert_eq!(run.output, ["9"]);
    assert_eq!(run.results[3], Ok(Some(Value::Int(3))));
}

#[test]
fn test_closures_do_not_share_local_defines() {
    let source = "
        (define make (fun (n) (fun (x) (define base n) (+ base x))))
        (define a (make 1))
        (define b (make 2))
        (a 0)
        (b 0)
        (a 10)
    ";
    let run = run(source);
    assert_eq!(run.results[3], Ok(Some(Value::Int(1))));
    assert_eq!(run.results[4], Ok(Some(Value::Int(2))));
    assert_eq!(run.results[5], Ok(Some(Value::Int(11))));
}

#[test]
fn test_non_define_before_body_is_rejected() {
    assert!(matches!(
        last("(fun (x) (+ x 1) x)"),
        Err(LispError::Syntax { .. })
    ));
}

#[test]
fn test_define_shape_errors() {
    assert!(matches!(last("(define x)"), Err(LispError::Syntax { .. })));
    assert!(matches!(last("(define x 1 2)"), Err(LispError::Syntax { .. })));
    assert!(matches!(
        last("(define (f) 1)"),
        Err(LispError::InvalidIdentifier { .. })
    ));
}

#[test]
fn test_builtin_can_be_redefined() {
    let run = run("(define not (fun (b) b)) (not #t)");
    assert_eq!(run.results[1], Ok(Some(Value::Bool(true))));
}
