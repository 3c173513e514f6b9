use monkey_interpreter as monkey;

use monkey::environment::Environment;
use monkey::evaluator::Evaluator;
use monkey::object::{Object, ObjectType, NULL};
use monkey::parser::parse_program;

use pretty_assertions::assert_eq;

fn eval_with(evaluator: &mut Evaluator<'_>, source: &str) -> Object {
    let program = parse_program(source).unwrap_or_else(|e| panic!("{:?}: {}", source, e));
    let env = Environment::new();

    evaluator.eval_program(&program, &env)
}

fn eval(source: &str) -> Object {
    eval_with(&mut Evaluator::new(), source)
}

/// Evaluates `source`, returning the result and everything `puts` wrote.
fn eval_capturing(source: &str) -> (Object, String) {
    let mut output: Vec<u8> = Vec::new();

    let result = {
        let mut evaluator = Evaluator::new().with_output(&mut output);
        eval_with(&mut evaluator, source)
    };

    (result, String::from_utf8(output).expect("utf-8 output"))
}

fn assert_error(source: &str, expected: &str) {
    match eval(source) {
        Object::Error(message) => assert_eq!(&*message, expected, "source: {}", source),
        other => panic!("expected error for {:?}, got {}", source, other),
    }
}

#[test]
fn integer_arithmetic() {
    let cases = [
        ("5", 5),
        ("-10", -10),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("2 * 2 * 2 * 2 * 2", 32),
        ("-50 + 100 + -50", 0),
        ("20 + 2 * -10", 0),
        ("50 / 2 * 2 + 10", 60),
        ("2 * (5 + 10)", 30),
        ("3 * (3 * 3) + 10", 37),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ("7 / 2", 3),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::Integer(expected), "source: {}", source);
    }
}

#[test]
fn boolean_expressions() {
    let cases = [
        ("true", true),
        ("false", false),
        ("1 < 2", true),
        ("1 > 2", false),
        ("2 <= 2", true),
        ("3 >= 4", false),
        ("1 == 1", true),
        ("1 != 1", false),
        ("true == true", true),
        ("true != false", true),
        ("(1 < 2) == true", true),
        ("(1 > 2) == true", false),
        ("\"a\" == \"a\"", true),
        ("\"a\" != \"b\"", true),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::from_bool(expected), "source: {}", source);
    }
}

#[test]
fn bang_operator_uses_truthiness() {
    let cases = [
        ("!true", false),
        ("!false", true),
        ("!5", false),
        ("!0", false),
        ("!\"\"", false),
        ("![]", false),
        ("!!true", true),
        ("!if (false) { 1 }", true),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::from_bool(expected), "source: {}", source);
    }
}

#[test]
fn truthiness_of_values() {
    assert!(Object::Integer(0).is_truthy());
    assert!(Object::string("").is_truthy());
    assert!(Object::array(vec![]).is_truthy());
    assert!(!Object::Boolean(false).is_truthy());
    assert!(!NULL.is_truthy());
}

#[test]
fn string_concatenation() {
    assert_eq!(
        eval("\"Hello\" + \" \" + \"World!\""),
        Object::string("Hello World!")
    );
}

#[test]
fn if_else_expressions() {
    let cases = [
        ("if (true) { 10 }", Object::Integer(10)),
        ("if (false) { 10 }", NULL),
        ("if (1) { 10 }", Object::Integer(10)),
        ("if (0) { 10 }", Object::Integer(10)),
        ("if (1 < 2) { 10 } else { 20 }", Object::Integer(10)),
        ("if (1 > 2) { 10 } else { 20 }", Object::Integer(20)),
        ("if (1 > 2) { 10 }", NULL),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), expected, "source: {}", source);
    }
}

#[test]
fn untaken_branch_is_not_evaluated() {
    assert_eq!(eval("if (true) { 1 } else { unbound }"), Object::Integer(1));
    assert_eq!(eval("if (false) { unbound } else { 2 }"), Object::Integer(2));
}

#[test]
fn sequence_value_is_last_statement() {
    assert_eq!(eval("1; 2; 3"), Object::Integer(3));
    assert_eq!(eval(""), NULL);
    assert_eq!(eval("let x = 5;"), NULL);
    assert_eq!(eval("let x = 5; x"), Object::Integer(5));
}

#[test]
fn return_statements() {
    let cases = [
        ("return 10;", 10),
        ("return 10; 9;", 10),
        ("return 2 * 5; 9;", 10),
        ("9; return 2 * 5; 9;", 10),
        ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
        ("let f = fn() { return 1; 2 }; f() + 10", 11),
        ("let f = fn(x) { if (x) { return 1; } 0 }; f(true) + f(false)", 1),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::Integer(expected), "source: {}", source);
    }
}

#[test]
fn let_bindings() {
    let cases = [
        ("let a = 5; a;", 5),
        ("let a = 5 * 5; a;", 25),
        ("let a = 5; let b = a; b;", 5),
        ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ("let a = 1; let a = a + 1; a", 2),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::Integer(expected), "source: {}", source);
    }
}

#[test]
fn function_object_captures_parameters_and_body() {
    match eval("fn(x) { x + 2; };") {
        Object::Function(function) => {
            assert_eq!(function.parameters.len(), 1);
            assert_eq!(function.parameters[0].name, "x");
            assert_eq!(function.body.to_string(), "{ (x + 2) }");
        }
        other => panic!("expected function, got {}", other),
    }
}

#[test]
fn function_application() {
    let cases = [
        ("let identity = fn(x) { x; }; identity(5);", 5),
        ("let identity = fn(x) { return x; }; identity(5);", 5),
        ("let double = fn(x) { x * 2; }; double(5);", 10),
        ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
        ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
        ("fn(x) { x; }(5)", 5),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), Object::Integer(expected), "source: {}", source);
    }
}

#[test]
fn closures_outlive_their_defining_call() {
    let source = "
        let makeAdder = fn(x) { return fn(y) { x + y }; };
        let addFive = makeAdder(5);
        makeAdder(5)(3) + addFive(10)
    ";

    assert_eq!(eval(source), Object::Integer(8 + 15));
}

#[test]
fn closures_capture_by_reference() {
    // `later` is bound in the captured frame after the closure is created.
    let source = "
        let f = fn() { later };
        let later = 42;
        f()
    ";

    assert_eq!(eval(source), Object::Integer(42));
}

#[test]
fn recursive_functions() {
    let source = "
        let fib = fn(n) { if (n < 2) { n } else { fib(n - 1) + fib(n - 2) } };
        fib(15)
    ";

    assert_eq!(eval(source), Object::Integer(610));
}

#[test]
fn array_literals_and_indexing() {
    assert_eq!(
        eval("[1, 2 * 2, 3 + 3]"),
        Object::array(vec![
            Object::Integer(1),
            Object::Integer(4),
            Object::Integer(6)
        ])
    );

    let cases = [
        ("[1, 2, 3][0]", Object::Integer(1)),
        ("[1, 2, 3][2]", Object::Integer(3)),
        ("let i = 0; [1][i];", Object::Integer(1)),
        ("[1, 2, 3][1 + 1];", Object::Integer(3)),
        ("let a = [1, 2, 3]; a[0] + a[1] + a[2];", Object::Integer(6)),
        ("[1, 2, 3][3]", NULL),
        ("[1, 2, 3][-1]", NULL),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source), expected, "source: {}", source);
    }
}

#[test]
fn array_and_function_equality_is_identity() {
    assert_eq!(eval("let a = [1]; a == a"), Object::from_bool(true));
    assert_eq!(eval("[1] == [1]"), Object::from_bool(false));
    assert_eq!(eval("let f = fn() { 1 }; f != f"), Object::from_bool(false));
    assert_eq!(eval("len == len"), Object::from_bool(true));
}

#[test]
fn error_messages() {
    let cases = [
        ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
        ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
        ("-true", "unknown operator: -BOOLEAN"),
        ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
        ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
        ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
        (
            "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        ("foobar", "identifier not found: foobar"),
        ("\"Hello\" - \"World\"", "unknown operator: STRING - STRING"),
        ("\"a\" < 1", "type mismatch: STRING < INTEGER"),
        ("5(1)", "not a function: INTEGER"),
        ("let x = \"s\"; x()", "not a function: STRING"),
        ("1 / 0", "division by zero"),
        (
            "9223372036854775807 + 1",
            "integer overflow: 9223372036854775807 + 1",
        ),
        ("1[0]", "index operator not supported: INTEGER[INTEGER]"),
        ("[1][true]", "index operator not supported: ARRAY[BOOLEAN]"),
    ];

    for (source, expected) in cases {
        assert_error(source, expected);
    }
}

#[test]
fn user_function_arity_is_enforced() {
    assert_error(
        "let f = fn(x, y) { x }; f(1)",
        "wrong number of arguments. got=1, want=2",
    );
    assert_error(
        "let f = fn() { 1 }; f(1, 2)",
        "wrong number of arguments. got=2, want=0",
    );
}

#[test]
fn errors_poison_remaining_siblings() {
    let cases = [
        "let f = fn(a, b) { a }; f(missing, puts(\"argument\"))",
        "[1, missing, puts(\"element\")]",
        "missing + puts(\"operand\")",
        "missing[puts(\"index\")]",
        "let x = missing; puts(\"statement\")",
        "if (missing) { puts(\"branch\") }",
    ];

    for source in cases {
        let (result, output) = eval_capturing(source);

        assert_eq!(result, Object::error("identifier not found: missing"), "source: {}", source);
        assert_eq!(output, "", "source: {}", source);
    }

    let (result, output) = eval_capturing("puts(\"a\"); [puts(\"b\"), missing, puts(\"c\")]");
    assert_eq!(result, Object::error("identifier not found: missing"));
    assert_eq!(output, "a\nb\n");
}

#[test]
fn errors_inside_calls_propagate_out() {
    assert_error(
        "let f = fn() { let g = fn() { nope }; g() + 1 }; f(); 99",
        "identifier not found: nope",
    );
}

#[test]
fn error_object_displays_with_prefix() {
    let result = eval("unbound");

    assert_eq!(result.object_type(), ObjectType::Error);
    assert_eq!(result.to_string(), "ERROR: identifier not found: unbound");
}

#[test]
fn call_depth_is_bounded() {
    let mut evaluator = Evaluator::with_max_depth(16);

    let result = eval_with(&mut evaluator, "let loop = fn(n) { loop(n + 1) }; loop(0)");
    assert_eq!(result, Object::error("maximum call depth of 16 exceeded"));

    // The counter unwinds after a failure, so the same evaluator keeps working.
    let result = eval_with(
        &mut evaluator,
        "let f = fn(n) { if (n == 0) { 7 } else { f(n - 1) } }; f(10)",
    );
    assert_eq!(result, Object::Integer(7));
}

#[test]
fn environment_persists_across_programs() {
    let mut evaluator = Evaluator::new();
    let env = Environment::new();

    for line in ["let x = 2;", "let double = fn(n) { n * x };"] {
        let program = parse_program(line).expect("parse");
        evaluator.eval_program(&program, &env);
    }

    let program = parse_program("double(21)").expect("parse");
    assert_eq!(evaluator.eval_program(&program, &env), Object::Integer(42));
}

#[test]
fn display_forms() {
    let cases = [
        ("5", "5"),
        ("-5", "-5"),
        ("\"text\"", "text"),
        ("true", "true"),
        ("if (false) { 1 }", "null"),
        ("[1, \"a\", [true]]", "[1, a, [true]]"),
        ("fn(x, y) { x + y }", "fn(x, y) { (x + y) }"),
        ("len", "builtin function len"),
    ];

    for (source, expected) in cases {
        assert_eq!(eval(source).to_string(), expected, "source: {}", source);
    }
}

#[test]
fn deep_recursion_grows_the_stack() {
    let result = eval("let f = fn(n) { if (n == 0) { 0 } else { 1 + f(n - 1) } }; f(199)");
    assert_eq!(result, Object::Integer(199));

    let result = eval(
        "let f = fn(n) { if (n == 0) { 0 } else { \
         [[[[if (true) { if (true) { 1 + f(n - 1) } }]]]][0][0][0][0] } }; f(199)",
    );
    assert_eq!(result, Object::Integer(199));

    let result = eval("let f = fn(n) { if (n == 0) { 0 } else { 1 + f(n - 1) } }; f(2000)");
    assert_eq!(result, Object::Integer(2000));
}

#[test]
fn recursion_over_long_arrays() {
    let source = "
        let build = fn(n, acc) { if (n == 0) { acc } else { build(n - 1, push(acc, n)) } };
        let sum = fn(a) { if (len(a) == 0) { 0 } else { first(a) + sum(rest(a)) } };
        sum(build(300, []))
    ";

    assert_eq!(eval(source), Object::Integer(45150));
}

#[test]
fn deeply_nested_expressions_evaluate() {
    let source = format!("{}true", "!".repeat(3000));
    assert_eq!(eval(&source), Object::Boolean(true));

    let source = format!("{}5{}", "(1 + ".repeat(1000), ")".repeat(1000));
    assert_eq!(eval(&source), Object::Integer(1005));
}
