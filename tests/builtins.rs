use std::io::{self, Write};

use monkey_interpreter as monkey;

use monkey::builtins::BUILTINS;
use monkey::environment::Environment;
use monkey::evaluator::Evaluator;
use monkey::object::{Object, NULL};
use monkey::parser::parse_program;

use pretty_assertions::assert_eq;

fn eval(source: &str) -> Object {
    let program = parse_program(source).unwrap_or_else(|e| panic!("{:?}: {}", source, e));
    let env = Environment::new();

    Evaluator::new().eval_program(&program, &env)
}

fn eval_capturing(source: &str) -> (Object, String) {
    let program = parse_program(source).unwrap_or_else(|e| panic!("{:?}: {}", source, e));
    let env = Environment::new();
    let mut output: Vec<u8> = Vec::new();

    let result = Evaluator::new()
        .with_output(&mut output)
        .eval_program(&program, &env);

    (result, String::from_utf8(output).expect("utf-8 output"))
}

struct ClosedSink;

impl Write for ClosedSink {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ints(values: &[i64]) -> Object {
    Object::array(values.iter().copied().map(Object::Integer).collect())
}

fn assert_error(source: &str, expected: &str) {
    assert_eq!(eval(source), Object::error(expected), "source: {}", source);
}

#[test]
fn table_holds_every_builtin() {
    let mut names: Vec<&str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();

    assert_eq!(
        names,
        ["first", "last", "len", "map", "push", "puts", "reduce", "rest"]
    );

    for (name, builtin) in BUILTINS.entries() {
        assert_eq!(*name, builtin.name);
    }
}

#[test]
fn len_counts_bytes_and_elements() {
    let cases = [
        ("len(\"\")", 0),
        ("len(\"four\")", 4),
        ("len(\"hello world\")", 11),
        ("len(\"é\")", 2),
        ("len([])", 0),
        ("len([1, 2, 3])", 3),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::Integer(expected), "source: {}", source);
    }
}

#[test]
fn len_rejects_other_types() {
    assert_error("len(5)", "argument to `len` not supported, got INTEGER");
    assert_error("len(true)", "argument to `len` not supported, got BOOLEAN");
    assert_error(
        "len(\"one\", \"two\")",
        "wrong number of arguments. got=2, want=1",
    );
    assert_error("len()", "wrong number of arguments. got=0, want=1");
}

#[test]
fn first_and_last() {
    assert_eq!(eval("first([1, 2, 3])"), Object::Integer(1));
    assert_eq!(eval("last([1, 2, 3])"), Object::Integer(3));
    assert_eq!(eval("first([])"), NULL);
    assert_eq!(eval("last([])"), NULL);

    assert_error("first(1)", "argument to `first` must be ARRAY, got INTEGER");
    assert_error("last(\"s\")", "argument to `last` must be ARRAY, got STRING");
}

#[test]
fn rest_drops_the_head() {
    assert_eq!(eval("rest([1, 2, 3])"), ints(&[2, 3]));
    assert_eq!(eval("rest([1])"), ints(&[]));
    assert_eq!(eval("rest([])"), NULL);
    assert_eq!(eval("let a = [1, 2, 3]; len(rest(a)) == len(a) - 1"), Object::from_bool(true));

    assert_error("rest(1)", "argument to `rest` must be ARRAY, got INTEGER");
}

#[test]
fn push_returns_a_new_array() {
    assert_eq!(eval("push([], 1)"), ints(&[1]));
    assert_eq!(eval("push([1, 2], 3)"), ints(&[1, 2, 3]));

    // The original array is left untouched.
    assert_eq!(eval("let a = [1, 2]; let b = push(a, 3); a"), ints(&[1, 2]));
    assert_eq!(eval("let a = [1, 2]; push(a, 3) == a"), Object::from_bool(false));

    assert_error("push(1, 1)", "argument to `push` must be ARRAY, got INTEGER");
    assert_error("push([1])", "wrong number of arguments. got=1, want=2");
}

#[test]
fn push_shares_element_instances() {
    let source = "let inner = [0]; let outer = push([], inner); first(outer) == inner";

    assert_eq!(eval(source), Object::from_bool(true));
}

#[test]
fn rest_of_push_keeps_length() {
    let cases = ["[]", "[1]", "[1, 2, 3]"];

    for array in cases {
        let source = format!("let a = {}; len(rest(push(a, 9))) == len(a)", array);
        assert_eq!(eval(&source), Object::from_bool(true), "array: {}", array);
    }
}

#[test]
fn map_applies_the_function() {
    assert_eq!(eval("map([1, 2, 3], fn(x) { x * 2 })"), ints(&[2, 4, 6]));
    assert_eq!(eval("map([], fn(x) { x })"), ints(&[]));
    assert_eq!(
        eval("let a = [1, \"two\", [3]]; let m = map(a, fn(x) { x }); m"),
        eval("[1, \"two\", [3]]")
    );
}

#[test]
fn map_uses_closures() {
    let source = "let k = 10; map([1, 2], fn(x) { x + k })";

    assert_eq!(eval(source), ints(&[11, 12]));
}

#[test]
fn map_stops_at_first_error() {
    let (result, output) = eval_capturing("map([1, 0, 2], fn(x) { puts(x); 10 / x })");
    assert_eq!(result, Object::error("division by zero"));
    assert_eq!(output, "1\n0\n");

    assert_error(
        "map([1], fn(x, y) { x })",
        "wrong number of arguments. got=1, want=2",
    );
}

#[test]
fn map_validates_arguments() {
    assert_error(
        "map(1, fn(x) { x })",
        "first argument to `map` must be ARRAY, got INTEGER",
    );
    assert_error(
        "map([1], len)",
        "second argument to `map` must be FUNCTION, got BUILTIN",
    );
    assert_error("map([1])", "wrong number of arguments. got=1, want=2");
}

#[test]
fn reduce_folds_left() {
    assert_eq!(
        eval("reduce([1, 2, 3], 0, fn(acc, el) { acc + el })"),
        Object::Integer(6)
    );
    assert_eq!(eval("reduce([], 7, fn(acc, el) { acc + el })"), Object::Integer(7));
    // Left fold: ((100 - 1) - 2) - 3
    assert_eq!(
        eval("reduce([1, 2, 3], 100, fn(acc, el) { acc - el })"),
        Object::Integer(94)
    );
}

#[test]
fn reduce_errors() {
    assert_error(
        "reduce([1, 2], 0, fn(acc, el) { missing })",
        "identifier not found: missing",
    );
    assert_error(
        "reduce([1], 0, fn(acc, el) { \"s\" })",
        "`reduce` callback must return INTEGER, got STRING",
    );
    assert_error(
        "reduce(1, 0, fn(acc, el) { acc })",
        "first argument to `reduce` must be ARRAY, got INTEGER",
    );
    assert_error(
        "reduce([1], \"0\", fn(acc, el) { acc })",
        "second argument to `reduce` must be INTEGER, got STRING",
    );
    assert_error(
        "reduce([1], 0, 1)",
        "third argument to `reduce` must be FUNCTION, got INTEGER",
    );
    assert_error(
        "reduce([1], 0)",
        "wrong number of arguments. got=2, want=3",
    );
}

#[test]
fn puts_returns_null() {
    assert_eq!(eval_capturing("puts()"), (NULL, String::new()));
    assert_eq!(
        eval_capturing("puts(1, \"two\", [3, true])"),
        (NULL, "1\ntwo\n[3, true]\n".to_string())
    );
}

#[test]
fn puts_reports_write_failures() {
    let program = parse_program("puts(1); 2").expect("parse");
    let env = Environment::new();

    let result = Evaluator::new()
        .with_output(ClosedSink)
        .eval_program(&program, &env);

    assert_eq!(result, Object::error("failed to write output: sink closed"));
}

#[test]
fn user_bindings_shadow_builtins() {
    assert_eq!(eval("let len = fn(x) { 42 }; len([1])"), Object::Integer(42));
}

#[test]
fn builtin_arguments_are_poisoned_by_errors() {
    assert_error("len(missing)", "identifier not found: missing");
    assert_error("push([1], 1 / 0)", "division by zero");
}
