extern crate toyc;

use indoc::indoc;
use std::panic::Location;
use toyc::compile;
use toyc::Emit;
use toyc::InputKind;
use toyir::tester::Tester;

const TRANSPOSE_TOY: &str = include_str!("data/transpose.toy");
const TRANSPOSE_MLIR: &str = include_str!("data/transpose.mlir");

#[test]
fn toy_to_mlir() {
    Tester::init_tracing();
    let actual = compile(TRANSPOSE_TOY, "transpose.toy", InputKind::Toy, Emit::Mlir).unwrap();
    let caller = Location::caller();
    Tester::check_lines_exact(&actual, TRANSPOSE_MLIR, caller);
    let (module, _printed) = Tester::round_trip(&actual, caller);
    assert_eq!(module.functions().count(), 2);
}

#[test]
fn mlir_to_mlir() {
    Tester::init_tracing();
    let actual = compile(TRANSPOSE_MLIR, "transpose.mlir", InputKind::Mlir, Emit::Mlir).unwrap();
    Tester::check_lines_exact(&actual, TRANSPOSE_MLIR, Location::caller());
}

#[test]
fn mlir_to_ast() {
    Tester::init_tracing();
    let result = compile(TRANSPOSE_MLIR, "transpose.mlir", InputKind::Mlir, Emit::Ast);
    assert!(result.is_err());
}

#[test]
fn toy_to_ast() {
    Tester::init_tracing();
    let expected = indoc! {"
    Module:
      Function
        Proto 'multiply_transpose' @transpose.toy:1:1
        Params: [a, b]
        Block {
          Return
            BinOp: * @transpose.toy:2:23
              Call 'transpose' [ @transpose.toy:2:10
                var: a @transpose.toy:2:20
              ]
              Call 'transpose' [ @transpose.toy:2:25
                var: b @transpose.toy:2:35
              ]
        } // Block
      Function
        Proto 'main' @transpose.toy:5:1
        Params: []
        Block {
          VarDecl a<2, 3> @transpose.toy:6:3
            Literal: <2, 3>[ <3>[ 1.000000e+00, 2.000000e+00, 3.000000e+00], <3>[ 4.000000e+00, 5.000000e+00, 6.000000e+00]] @transpose.toy:6:17
          VarDecl b<2, 3> @transpose.toy:7:3
            Literal: <6>[ 1.000000e+00, 2.000000e+00, 3.000000e+00, 4.000000e+00, 5.000000e+00, 6.000000e+00] @transpose.toy:7:17
          VarDecl c<> @transpose.toy:8:3
            Call 'multiply_transpose' [ @transpose.toy:8:11
              var: a @transpose.toy:8:30
              var: b @transpose.toy:8:33
            ]
          VarDecl d<> @transpose.toy:9:3
            Call 'multiply_transpose' [ @transpose.toy:9:11
              var: b @transpose.toy:9:30
              var: a @transpose.toy:9:33
            ]
          Print [ @transpose.toy:10:3
            var: d @transpose.toy:10:9
          ]
        } // Block
    "};
    let actual = compile(TRANSPOSE_TOY, "transpose.toy", InputKind::Toy, Emit::Ast).unwrap();
    Tester::check_lines_exact(&actual, expected, Location::caller());
}

#[test]
fn scalars_and_void_returns() {
    Tester::init_tracing();
    let src = indoc! {"
    # Comments are skipped.
    def show(x) {
      print(x);
      return;
    }

    def main() {
      var s = 5.5;
      show(s + s);
    }
    "};
    let expected = indoc! {r#"
    func @show(%arg0: tensor<*xf64> loc("s.toy":2:1)) {
      toy.print %arg0 : tensor<*xf64> loc("s.toy":3:3)
      toy.return loc("s.toy":4:3)
    } loc("s.toy":2:1)
    func @main() {
      %0 = toy.constant dense<5.5> : tensor<*xf64> loc("s.toy":8:11)
      %1 = toy.add %0, %0 : tensor<*xf64> loc("s.toy":9:10)
      toy.generic_call @show(%1) : (tensor<*xf64>) -> () loc("s.toy":9:3)
      toy.return loc("s.toy":7:1)
    } loc("s.toy":7:1)
    "#};
    let actual = compile(src, "s.toy", InputKind::Toy, Emit::Mlir).unwrap();
    Tester::check_lines_contain(&actual, expected, Location::caller());
    Tester::round_trip(&actual, Location::caller());
}

#[test]
fn front_end_errors() {
    Tester::init_tracing();
    let compile_toy = |src: &str| compile(src, "e.toy", InputKind::Toy, Emit::Mlir);

    let err = compile_toy("def main() { var a = 1 % 2; }").unwrap_err();
    assert!(err.to_string().contains("lex error at e.toy:1:24"), "{err}");

    let err = compile_toy("def main() { var a = [1, 2] - [3, 4]; }").unwrap_err();
    assert!(err.to_string().contains("'-' is not supported"), "{err}");

    let err = compile_toy("def main() { var a = [1, 2] + 1 }").unwrap_err();
    assert!(err.to_string().contains("after expression"), "{err}");
}
