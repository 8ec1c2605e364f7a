extern crate toyir;

use indoc::formatdoc;
use indoc::indoc;
use toyir::ir::Location;
use toyir::tester::Tester;
use toyir::Error;

fn call_foo(declared_inputs: &str) -> String {
    formatdoc! {"
        module {{
          func @foo({}) -> tensor<*xf64> {{
            %0 = toy.constant dense<1.0> : tensor<*xf64> loc(unknown)
            toy.return %0 : tensor<*xf64> loc(unknown)
          }} loc(unknown)
          func @main(%arg0: tensor<*xf64>) {{
            %0 = toy.generic_call @foo(%arg0) : (tensor<*xf64>) -> tensor<*xf64> loc(unknown)
            toy.return loc(unknown)
          }} loc(unknown)
        }}
        ", declared_inputs}
}

#[test]
fn call_arity() {
    Tester::init_tracing();
    let (module, _actual) = Tester::parse(&call_foo("%arg0: tensor<*xf64>"));
    assert_eq!(module.functions().count(), 2);

    let err = Tester::parse_err(&call_foo(""));
    assert!(err.is_verification(), "{err}");
    assert!(err.to_string().contains("@foo"), "{err}");
}

#[test]
fn call_type_must_match_callee() {
    Tester::init_tracing();
    let src = indoc! {"
    func @foo(%arg0: tensor<*xf64>) -> tensor<*xf64> {
      toy.return %arg0 : tensor<*xf64> loc(unknown)
    } loc(unknown)
    func @main(%arg0: tensor<*xf64>) {
      %0 = toy.generic_call @foo(%arg0) : (tensor<*xf64>) -> tensor<2xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");
}

#[test]
fn unknown_callee() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main() {
      %0 = toy.generic_call @missing() : () -> tensor<*xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert_eq!(
        err,
        Error::UnresolvedSymbol {
            location: Location::file_line_col("-", 2, 25),
            name: "@missing".to_string(),
        }
    );
}

#[test]
fn undefined_value() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main() {
      toy.print %7 : tensor<*xf64> loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(matches!(err, Error::UnresolvedSymbol { .. }), "{err}");
}

#[test]
fn functions_are_isolated() {
    Tester::init_tracing();
    let src = indoc! {"
    func @f(%arg0: tensor<*xf64>) {
      toy.return loc(unknown)
    } loc(unknown)
    func @g() {
      toy.print %arg0 : tensor<*xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(matches!(err, Error::UnresolvedSymbol { .. }), "{err}");
}

#[test]
fn constant_shape_mismatch() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main() {
      %0 = toy.constant dense<[1.0, 2.0, 3.0]> : tensor<2x2xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");

    let src = src.replace("tensor<2x2xf64>", "tensor<2x?xf64>");
    let err = Tester::parse_err(&src);
    assert!(err.to_string().contains("static tensor"), "{err}");
}

#[test]
fn add_of_integers() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main(%arg0: tensor<*xs32i>) {
      %0 = toy.add %arg0, %arg0 : tensor<*xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");
    assert!(err.to_string().contains("'toy.add'"), "{err}");
}

#[test]
fn return_arity() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main() -> tensor<*xf64> {
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");
}

#[test]
fn return_placement() {
    Tester::init_tracing();
    let src = indoc! {"
    func @f() -> tensor<*xf64> {
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");

    let src = indoc! {"
    func @f(%arg0: tensor<*xf64>) {
      toy.return loc(unknown)
      toy.print %arg0 : tensor<*xf64> loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.to_string().contains("must be the last op"), "{err}");
}

#[test]
fn nested_function() {
    Tester::init_tracing();
    let src = indoc! {"
    func @outer() {
      func @inner() {
        toy.return loc(unknown)
      } loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    match err {
        Error::Parse {
            location,
            expected,
            actual,
            ..
        } => {
            assert_eq!(location, Location::file_line_col("-", 2, 3));
            assert_eq!(expected, "an operation inside a function body");
            assert_eq!(actual, "a nested function");
        }
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn annotated_type_must_match() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main(%arg0: tensor<2x3xf64>) {
      toy.print %arg0 : tensor<*xf64> loc(unknown)
      toy.return loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(err.is_verification(), "{err}");
}

#[test]
fn unknown_operation() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main() {
      %0 = toy.sub %1, %2 : tensor<*xf64> loc(unknown)
    } loc(unknown)
    "};
    let err = Tester::parse_err(src);
    match err {
        Error::Parse {
            location,
            expected,
            actual,
            snippet,
        } => {
            assert_eq!(location, Location::file_line_col("-", 2, 8));
            assert_eq!(expected, "a registered operation");
            assert_eq!(actual, "`toy.sub`");
            assert!(snippet.contains("^"), "{snippet}");
        }
        other => panic!("expected a parse error, got {other}"),
    }
}

#[test]
fn missing_closing_brace() {
    Tester::init_tracing();
    let src = indoc! {"
    module {
      func @main() {
        toy.return loc(unknown)
    "};
    let err = Tester::parse_err(src);
    assert!(matches!(err, Error::Parse { .. }), "{err}");
}
