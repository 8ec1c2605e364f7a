extern crate toyir;

use indoc::indoc;
use std::panic::Location;
use toyir::dialect::toy::TransposeOp;
use toyir::ir::AnyOp;
use toyir::ir::Op;
use toyir::ir::Type;
use toyir::parser::Parser;
use toyir::printer::Printer;
use toyir::tester::Tester;

#[test]
fn parse_constant() {
    Tester::init_tracing();
    let src = "%0 = toy.constant dense<[1.0,2.0,3.0,4.0]> : tensor<2x2xf64> loc(unknown)";
    let mut parser = Parser::new(src, "-").unwrap();
    let op = parser.parse_op().unwrap();
    let AnyOp::Constant(constant) = &op else {
        panic!("expected a constant, got {}", op.name());
    };
    assert_eq!(
        constant.operation().result_types(),
        vec![Type::ranked_f64_tensor(vec![2, 2])]
    );
    assert_eq!(constant.value().values(), &[1.0, 2.0, 3.0, 4.0]);

    let mut printer = Printer::new();
    printer.print_op(&op).unwrap();
    assert_eq!(printer.finish(), src);

    // Results without names cannot be used, but the op is still valid.
    let src = "toy.constant dense<[1.0,2.0,3.0,4.0]> : tensor<2x2xf64> loc(unknown)";
    let mut parser = Parser::new(src, "-").unwrap();
    let op = parser.parse_op().unwrap();
    let mut printer = Printer::new();
    printer.print_op(&op).unwrap();
    assert_eq!(printer.finish(), format!("%0 = {src}"));
}

#[test]
fn parse_multiply_transpose() {
    Tester::init_tracing();
    let src = indoc! {r#"
    module {
      func @multiply_transpose(%arg0: tensor<*xf64> loc("test.toy":4:1), %arg1: tensor<*xf64> loc("test.toy":4:1)) -> tensor<*xf64> {
        %0 = toy.transpose(%arg0 : tensor<*xf64>) to tensor<*xf64> loc("test.toy":5:10)
        %1 = toy.transpose(%arg1 : tensor<*xf64>) to tensor<*xf64> loc("test.toy":5:25)
        %2 = toy.mul %0, %1 : tensor<*xf64> loc("test.toy":5:25)
        toy.return %2 : tensor<*xf64> loc("test.toy":5:3)
      } loc("test.toy":4:1)
      func @main() {
        %0 = toy.constant dense<[1.0,2.0,3.0,4.0,5.0,6.0]> : tensor<2x3xf64> loc("test.toy":9:17)
        %1 = toy.reshape(%0 : tensor<2x3xf64>) to tensor<2x3xf64> loc("test.toy":9:3)
        %2 = toy.constant dense<[1.0,2.0,3.0,4.0,5.0,6.0]> : tensor<6xf64> loc("test.toy":10:17)
        %3 = toy.reshape(%2 : tensor<6xf64>) to tensor<2x3xf64> loc("test.toy":10:3)
        %4 = toy.generic_call @multiply_transpose(%1, %3) : (tensor<2x3xf64>, tensor<2x3xf64>) -> tensor<*xf64> loc("test.toy":11:11)
        %5 = toy.generic_call @multiply_transpose(%3, %1) : (tensor<2x3xf64>, tensor<2x3xf64>) -> tensor<*xf64> loc("test.toy":12:11)
        toy.print %5 : tensor<*xf64> loc("test.toy":13:3)
        toy.return loc("test.toy":8:1)
      } loc("test.toy":8:1)
    }
    "#};
    let caller = Location::caller();
    let (module, actual) = Tester::round_trip(src, caller);
    Tester::check_lines_exact(&actual, src, caller);

    let main = module.lookup("main").unwrap();
    assert_eq!(main.body().ops().len(), 8);
    assert!(main.body().has_terminator());
    let callee = module.lookup("multiply_transpose").unwrap();
    assert_eq!(callee.function_type().inputs().len(), 2);
}

#[test]
fn transpose_of_ranked_tensor() {
    Tester::init_tracing();
    let src = indoc! {"
    func @main(%arg0: tensor<2x3xf64>) -> tensor<3x2xf64> {
      %0 = toy.transpose(%arg0 : tensor<2x3xf64>) to tensor<3x2xf64> loc(unknown)
      toy.return %0 : tensor<3x2xf64> loc(unknown)
    } loc(unknown)
    "};
    let (module, actual) = Tester::parse(src);
    Tester::check_lines_contain(&actual, src, Location::caller());
    let main = module.lookup("main").unwrap();
    let argument = main.arguments()[0].clone();
    let op = TransposeOp::new(Default::default(), argument).unwrap();
    assert_eq!(op.results()[0].typ().to_string(), "tensor<3x2xf64>");
}

#[test]
fn implicit_module_and_alias() {
    Tester::init_tracing();
    let src = indoc! {"
    toy.func @main() {
      %0 = toy.constant dense<5.5> : tensor<*xf64>
      toy.print %0 : tensor<*xf64>
      toy.return
    }
    "};
    let expected = indoc! {"
    module {
      func @main() {
        %0 = toy.constant dense<5.5> : tensor<*xf64> loc(unknown)
        toy.print %0 : tensor<*xf64> loc(unknown)
        toy.return loc(unknown)
      } loc(unknown)
    }
    "};
    let (_module, actual) = Tester::round_trip(src, Location::caller());
    Tester::check_lines_exact(&actual, expected, Location::caller());
}

#[test]
fn names_are_renumbered() {
    Tester::init_tracing();
    let src = indoc! {"
    module @renamed {
      func @f(%a: tensor<*xf64>, %b: tensor<*xf64>) -> tensor<*xf64> {
        %sum = toy.add %a, %b : tensor<*xf64>
        %x = toy.mul %sum, %a : tensor<*xf64>
        toy.return %x : tensor<*xf64>
      }
    }
    "};
    let expected = indoc! {"
    module @renamed {
      func @f(%arg0: tensor<*xf64>, %arg1: tensor<*xf64>) -> tensor<*xf64> {
        %0 = toy.add %arg0, %arg1 : tensor<*xf64> loc(unknown)
        %1 = toy.mul %0, %arg0 : tensor<*xf64> loc(unknown)
        toy.return %1 : tensor<*xf64> loc(unknown)
      } loc(unknown)
    }
    "};
    let (module, actual) = Tester::parse(src);
    Tester::check_lines_exact(&actual, expected, Location::caller());
    assert_eq!(module.sym_name(), Some("renamed"));
    // Every print starts from a fresh name table.
    assert_eq!(module.to_string(), actual);
}

#[test]
fn recursive_call() {
    Tester::init_tracing();
    let src = indoc! {"
    func @f(%arg0: tensor<*xf64>) -> tensor<*xf64> {
      %0 = toy.generic_call @f(%arg0) : (tensor<*xf64>) -> tensor<*xf64> loc(unknown)
      toy.return %0 : tensor<*xf64> loc(unknown)
    } loc(unknown)
    "};
    let (_module, actual) = Tester::round_trip(src, Location::caller());
    Tester::check_lines_contain(&actual, src, Location::caller());
}
