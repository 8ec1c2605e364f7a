//! Syntax tree of the toy language.
//!
//! The tree is produced by [crate::parser] and consumed by
//! [crate::mlir_gen]. [ModuleAst::dump] renders it as an indented listing,
//! which is what `toyc -emit=ast` prints.
use crate::lexer::Location;

#[derive(Clone, Debug, PartialEq)]
pub enum ExprAst {
    /// `var name<shape> = init`. An empty shape means none was given.
    VarDecl {
        location: Location,
        name: String,
        shape: Vec<i64>,
        init: Box<ExprAst>,
    },
    Return {
        location: Location,
        value: Option<Box<ExprAst>>,
    },
    Number {
        location: Location,
        value: f64,
    },
    /// `[[1, 2], [3, 4]]`. Each value is a [ExprAst::Number] or a nested
    /// [ExprAst::Literal] with the remaining dims.
    Literal {
        location: Location,
        values: Vec<ExprAst>,
        dims: Vec<i64>,
    },
    Var {
        location: Location,
        name: String,
    },
    BinOp {
        location: Location,
        op: char,
        lhs: Box<ExprAst>,
        rhs: Box<ExprAst>,
    },
    Call {
        location: Location,
        callee: String,
        args: Vec<ExprAst>,
    },
    Print {
        location: Location,
        arg: Box<ExprAst>,
    },
}

impl ExprAst {
    pub fn location(&self) -> &Location {
        match self {
            ExprAst::VarDecl { location, .. } => location,
            ExprAst::Return { location, .. } => location,
            ExprAst::Number { location, .. } => location,
            ExprAst::Literal { location, .. } => location,
            ExprAst::Var { location, .. } => location,
            ExprAst::BinOp { location, .. } => location,
            ExprAst::Call { location, .. } => location,
            ExprAst::Print { location, .. } => location,
        }
    }
    /// All numbers of a literal in row-major order.
    pub fn flatten(&self) -> Vec<f64> {
        let mut out = vec![];
        fn walk(expr: &ExprAst, out: &mut Vec<f64>) {
            match expr {
                ExprAst::Number { value, .. } => out.push(*value),
                ExprAst::Literal { values, .. } => values.iter().for_each(|v| walk(v, out)),
                _ => {}
            }
        }
        walk(self, &mut out);
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrototypeAst {
    pub location: Location,
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionAst {
    pub proto: PrototypeAst,
    pub body: Vec<ExprAst>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleAst {
    pub functions: Vec<FunctionAst>,
}

impl ModuleAst {
    pub fn dump(&self) -> String {
        let mut dumper = Dumper::default();
        dumper.module(self);
        dumper.out
    }
}

/// Format like C's `%e`, for example `1.000000e+00`.
fn scientific(value: f64) -> String {
    let formatted = format!("{value:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Default)]
struct Dumper {
    out: String,
    indent: usize,
}

impl Dumper {
    fn line(&mut self, text: &str) {
        self.out.push_str(&"  ".repeat(self.indent));
        self.out.push_str(text);
        self.out.push('\n');
    }
    fn nested(&mut self, f: impl FnOnce(&mut Dumper)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }
    fn module(&mut self, module: &ModuleAst) {
        self.line("Module:");
        self.nested(|d| {
            for function in &module.functions {
                d.function(function);
            }
        });
    }
    fn function(&mut self, function: &FunctionAst) {
        self.line("Function");
        self.nested(|d| {
            let proto = &function.proto;
            d.line(&format!("Proto '{}' @{}", proto.name, proto.location));
            d.line(&format!("Params: [{}]", proto.args.join(", ")));
            d.line("Block {");
            d.nested(|d| function.body.iter().for_each(|expr| d.expr(expr)));
            d.line("} // Block");
        });
    }
    fn literal(expr: &ExprAst) -> String {
        match expr {
            ExprAst::Literal { values, dims, .. } => {
                let values: Vec<String> = values.iter().map(Dumper::literal).collect();
                format!("<{}>[ {}]", join(dims), values.join(", "))
            }
            ExprAst::Number { value, .. } => scientific(*value),
            other => format!("<{:?}>", other),
        }
    }
    fn expr(&mut self, expr: &ExprAst) {
        match expr {
            ExprAst::VarDecl {
                location,
                name,
                shape,
                init,
            } => {
                self.line(&format!("VarDecl {name}<{}> @{location}", join(shape)));
                self.nested(|d| d.expr(init));
            }
            ExprAst::Return { value, .. } => {
                self.line("Return");
                self.nested(|d| match value {
                    Some(value) => d.expr(value),
                    None => d.line("(void)"),
                });
            }
            ExprAst::Number { location, value } => {
                self.line(&format!("{} @{location}", scientific(*value)));
            }
            ExprAst::Literal { location, .. } => {
                self.line(&format!("Literal: {} @{location}", Dumper::literal(expr)));
            }
            ExprAst::Var { location, name } => {
                self.line(&format!("var: {name} @{location}"));
            }
            ExprAst::BinOp {
                location,
                op,
                lhs,
                rhs,
            } => {
                self.line(&format!("BinOp: {op} @{location}"));
                self.nested(|d| {
                    d.expr(lhs);
                    d.expr(rhs);
                });
            }
            ExprAst::Call {
                location,
                callee,
                args,
            } => {
                self.line(&format!("Call '{callee}' [ @{location}"));
                self.nested(|d| args.iter().for_each(|arg| d.expr(arg)));
                self.line("]");
            }
            ExprAst::Print { location, arg } => {
                self.line(&format!("Print [ @{location}"));
                self.nested(|d| d.expr(arg));
                self.line("]");
            }
        }
    }
}
