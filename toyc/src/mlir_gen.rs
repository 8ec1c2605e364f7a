//! Lower the toy syntax tree to IR.
//!
//! Every toy value is a tensor of f64, and functions are generic over the
//! shape of their arguments. That is why all function inputs and outputs
//! are `tensor<*xf64>`. Shapes only become known through literals and
//! `var x<shape>` declarations.
use crate::ast::ExprAst;
use crate::ast::FunctionAst;
use crate::ast::ModuleAst;
use crate::lexer::Location;
use crate::Error;
use crate::Result;
use std::collections::HashMap;
use toyir::dialect::func::FuncOp;
use toyir::dialect::toy::AddOp;
use toyir::dialect::toy::ConstantOp;
use toyir::dialect::toy::GenericCallOp;
use toyir::dialect::toy::MulOp;
use toyir::dialect::toy::PrintOp;
use toyir::dialect::toy::ReshapeOp;
use toyir::dialect::toy::ReturnOp;
use toyir::dialect::toy::TransposeOp;
use toyir::ir::AnyOp;
use toyir::ir::Block;
use toyir::ir::DenseAttr;
use toyir::ir::FunctionType;
use toyir::ir::ModuleOp;
use toyir::ir::Type;
use toyir::ir::Value;
use toyir::scope::SymbolTable;
use tracing::debug;

/// Generate a module with one function per toy definition.
pub fn mlir_gen(module: &ModuleAst) -> Result<ModuleOp> {
    let signatures = collect_signatures(module)?;
    let mut functions = vec![];
    for function in &module.functions {
        functions.push(FunctionGen::new(&signatures).function(function)?);
    }
    Ok(ModuleOp::from_functions(functions)?)
}

fn returns_value(function: &FunctionAst) -> bool {
    function
        .body
        .iter()
        .any(|expr| matches!(expr, ExprAst::Return { value: Some(_), .. }))
}

/// Register every prototype so that calls can refer to functions that are
/// defined further down.
fn collect_signatures(module: &ModuleAst) -> Result<HashMap<String, FunctionType>> {
    let mut signatures = HashMap::new();
    for function in &module.functions {
        let proto = &function.proto;
        let inputs = vec![Type::f64_tensor(); proto.args.len()];
        let outputs = if returns_value(function) {
            vec![Type::f64_tensor()]
        } else {
            vec![]
        };
        let typ = FunctionType::new(inputs, outputs);
        if signatures.insert(proto.name.clone(), typ).is_some() {
            let msg = format!("redefinition of function '{}'", proto.name);
            return Err(Error::gen(&proto.location, msg));
        }
    }
    Ok(signatures)
}

struct FunctionGen<'a> {
    signatures: &'a HashMap<String, FunctionType>,
    symbols: SymbolTable<Value>,
    block: Block,
}

impl<'a> FunctionGen<'a> {
    fn new(signatures: &'a HashMap<String, FunctionType>) -> Self {
        FunctionGen {
            signatures,
            symbols: SymbolTable::new(),
            block: Block::default(),
        }
    }
    fn declare(&mut self, name: &str, value: Value, location: &Location) -> Result<()> {
        if self.symbols.contains_in_current(&name.to_string()) {
            let msg = format!("variable '{name}' is already declared");
            return Err(Error::gen(location, msg));
        }
        debug!("Declaring variable {name}");
        self.symbols.insert(name.to_string(), value);
        Ok(())
    }
    /// Append `op` and return its result, if it has one.
    fn push(&mut self, op: impl Into<AnyOp>) -> Option<Value> {
        self.block.push(op.into()).into_iter().next()
    }
    fn function(mut self, function: &FunctionAst) -> Result<FuncOp> {
        let proto = &function.proto;
        debug!("Generating function {}", proto.name);
        let typ = match self.signatures.get(&proto.name) {
            Some(typ) => typ.clone(),
            None => return Err(Error::gen(&proto.location, "function was not declared")),
        };
        let location = toyir::ir::Location::from(&proto.location);
        self.block = Block::new(typ.inputs().to_vec());
        self.symbols.push_isolated();
        let arguments = self.block.arguments().to_vec();
        for (name, argument) in proto.args.iter().zip(arguments) {
            self.declare(name, argument, &proto.location)?;
        }
        for expr in &function.body {
            if self.block.has_terminator() {
                let msg = "no statement may follow 'return'";
                return Err(Error::gen(expr.location(), msg));
            }
            self.statement(expr)?;
        }
        if !self.block.has_terminator() {
            self.push(ReturnOp::new(location.clone(), None)?);
        }
        self.symbols.pop();
        let argument_locations = vec![Some(location.clone()); proto.args.len()];
        let func = FuncOp::with_argument_locations(
            location,
            &proto.name,
            typ,
            argument_locations,
            self.block,
        )?;
        Ok(func)
    }
    fn statement(&mut self, expr: &ExprAst) -> Result<()> {
        match expr {
            ExprAst::VarDecl {
                location,
                name,
                shape,
                init,
            } => {
                let mut value = self.value(init)?;
                if !shape.is_empty() {
                    let typ = Type::ranked_f64_tensor(shape.clone());
                    value = self.value_of(ReshapeOp::new(location.into(), value, typ)?, location)?;
                }
                self.declare(name, value, location)
            }
            ExprAst::Return { location, value } => {
                let value = match value {
                    Some(value) => Some(self.value(value)?),
                    None => None,
                };
                self.push(ReturnOp::new(location.into(), value)?);
                Ok(())
            }
            ExprAst::Print { location, arg } => {
                let input = self.value(arg)?;
                self.push(PrintOp::new(location.into(), input)?);
                Ok(())
            }
            other => {
                self.expr(other)?;
                Ok(())
            }
        }
    }
    /// Like [FunctionGen::push] for ops that must produce a value.
    fn value_of(&mut self, op: impl Into<AnyOp>, location: &Location) -> Result<Value> {
        match self.push(op) {
            Some(value) => Ok(value),
            None => Err(Error::gen(location, "expression does not produce a value")),
        }
    }
    fn value(&mut self, expr: &ExprAst) -> Result<Value> {
        match self.expr(expr)? {
            Some(value) => Ok(value),
            None => Err(Error::gen(expr.location(), "expression does not produce a value")),
        }
    }
    fn expr(&mut self, expr: &ExprAst) -> Result<Option<Value>> {
        match expr {
            ExprAst::Number { location, value } => {
                let op = ConstantOp::new(location.into(), DenseAttr::scalar(*value))?;
                Ok(self.push(op))
            }
            ExprAst::Literal { location, dims, .. } => {
                let attr = DenseAttr::new(dims.clone(), expr.flatten());
                Ok(self.push(ConstantOp::new(location.into(), attr)?))
            }
            ExprAst::Var { location, name } => match self.symbols.lookup(name) {
                Some(value) => Ok(Some(value.clone())),
                None => Err(Error::gen(location, format!("unknown variable '{name}'"))),
            },
            ExprAst::BinOp {
                location,
                op,
                lhs,
                rhs,
            } => {
                let lhs = self.value(lhs)?;
                let rhs = self.value(rhs)?;
                let loc = location.into();
                match op {
                    '+' => Ok(self.push(AddOp::new(loc, lhs, rhs)?)),
                    '*' => Ok(self.push(MulOp::new(loc, lhs, rhs)?)),
                    op => {
                        let msg = format!("binary operator '{op}' is not supported");
                        Err(Error::gen(location, msg))
                    }
                }
            }
            ExprAst::Call {
                location,
                callee,
                args,
            } => {
                let mut inputs = vec![];
                for arg in args {
                    inputs.push(self.value(arg)?);
                }
                self.call(location, callee, inputs)
            }
            ExprAst::Print { location, .. } => {
                Err(Error::gen(location, "print does not produce a value"))
            }
            ExprAst::VarDecl { location, .. } | ExprAst::Return { location, .. } => {
                Err(Error::gen(location, "statement used as an expression"))
            }
        }
    }
    fn call(
        &mut self,
        location: &Location,
        callee: &str,
        inputs: Vec<Value>,
    ) -> Result<Option<Value>> {
        if callee == "transpose" {
            let count = inputs.len();
            let mut inputs = inputs.into_iter();
            return match (inputs.next(), inputs.next()) {
                (Some(input), None) => Ok(self.push(TransposeOp::new(location.into(), input)?)),
                _ => {
                    let msg = format!("transpose takes 1 argument, but got {count}");
                    Err(Error::gen(location, msg))
                }
            };
        }
        let typ = match self.signatures.get(callee) {
            Some(typ) => typ,
            None => return Err(Error::gen(location, format!("unknown function '{callee}'"))),
        };
        let op = GenericCallOp::new(location.into(), callee, typ, inputs)?;
        Ok(self.push(op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use indoc::indoc;
    use toyir::ir::Op;

    fn generate(src: &str) -> Result<ModuleOp> {
        let module = Parser::parse(src, "test.toy")?;
        mlir_gen(&module)
    }

    fn gen_err(src: &str) -> String {
        match generate(src) {
            Ok(module) => panic!("Expected an error, but generated:\n{module}"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn signatures() {
        let src = indoc! {"
        def main() {
          print(twice([1, 2]));
        }
        def twice(a) {
          return a + a;
        }
        "};
        let module = generate(src).unwrap();
        let main = module.lookup("main").unwrap();
        assert_eq!(main.function_type().to_string(), "() -> ()");
        let twice = module.lookup("twice").unwrap();
        assert_eq!(
            twice.function_type().to_string(),
            "(tensor<*xf64>) -> tensor<*xf64>"
        );
        assert!(main.body().has_terminator());
    }

    #[test]
    fn implicit_return() {
        let module = generate("def main() { var a = 5; print(a); }").unwrap();
        let main = module.lookup("main").unwrap();
        let ops = main.body().ops();
        assert_eq!(ops.len(), 3);
        let AnyOp::Constant(constant) = &ops[0] else {
            panic!("expected a constant");
        };
        assert!(constant.value().is_scalar());
        assert!(matches!(ops[2], AnyOp::Return(_)));
        assert_eq!(ops[2].location().to_string(), "loc(\"test.toy\":1:1)");
    }

    #[test]
    fn variables() {
        let err = gen_err("def main() { var a = 1; var a = 2; }");
        assert!(err.contains("variable 'a' is already declared"), "{err}");
        assert!(err.starts_with("codegen error at test.toy:1:25"), "{err}");

        let err = gen_err("def f(a) { var a = 1; }");
        assert!(err.contains("already declared"), "{err}");

        let err = gen_err("def main() { print(b); }");
        assert!(err.contains("unknown variable 'b'"), "{err}");

        let err = gen_err("def f(a) { return a; } def main() { print(a); }");
        assert!(err.contains("unknown variable 'a'"), "{err}");
    }

    #[test]
    fn unsupported_and_invalid_calls() {
        let err = gen_err("def main() { var a = [1] - [2]; }");
        assert!(err.contains("binary operator '-' is not supported"), "{err}");

        let err = gen_err("def main() { var a = missing(1); }");
        assert!(err.contains("unknown function 'missing'"), "{err}");

        let err = gen_err("def f(a) { return a; } def main() { var b = f(); }");
        assert!(err.contains("@f"), "{err}");

        let err = gen_err("def main() { var a = transpose(1, 2); }");
        assert!(err.contains("transpose takes 1 argument"), "{err}");

        let err = gen_err("def f() { } def main() { var a = f(); }");
        assert!(err.contains("does not produce a value"), "{err}");

        let err = gen_err("def f() { } def f() { }");
        assert!(err.contains("redefinition of function 'f'"), "{err}");

        let err = gen_err("def main() { return; print(1); }");
        assert!(err.contains("may follow 'return'"), "{err}");
    }

    #[test]
    fn reshape_needs_ranked_input() {
        let module = generate("def main() { var a<2, 2> = [1, 2, 3, 4]; print(a); }").unwrap();
        let main = module.lookup("main").unwrap();
        let AnyOp::Reshape(reshape) = &main.body().ops()[1] else {
            panic!("expected a reshape");
        };
        assert_eq!(reshape.results()[0].typ().to_string(), "tensor<2x2xf64>");

        let err = gen_err("def f(a) { var b<2> = a; }");
        assert!(err.contains("ranked operand"), "{err}");

        let err = gen_err("def main() { var a<3> = [1, 2]; }");
        assert!(err.contains("elements"), "{err}");

        let err = gen_err("def main() { var a<10000000000, 10000000000> = [1]; }");
        assert!(err.contains("too many elements"), "{err}");
    }
}
