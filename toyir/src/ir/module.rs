use crate::dialect::func::FuncOp;
use crate::ir::AnyOp;
use crate::ir::Block;
use crate::ir::Location;
use crate::ir::Op;
use crate::ir::Operation;
use crate::ir::OperationName;
use crate::parser::Parser;
use crate::parser::TokenKind;
use crate::printer::Printer;
use crate::Error;
use crate::Result;
use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;
use tracing::debug;

/// The top-level container: a named or anonymous list of functions.
///
/// ```mlir
/// module @name {
///   func @main() {
///     ...
///   } loc(unknown)
/// }
/// ```
///
/// Functions are kept (and printed) in insertion order. Function names are
/// unique within a module.
#[derive(Debug)]
pub struct ModuleOp {
    operation: Operation,
    sym_name: Option<String>,
}

impl Op for ModuleOp {
    fn operation_name() -> OperationName {
        OperationName::new("module".to_string())
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        if let Some(sym_name) = &self.sym_name {
            printer.write(&format!(" @{sym_name}"));
        }
        printer.write(" {");
        printer.newline();
        printer.enter_scope();
        printer.print_block(self.body())?;
        printer.leave_scope();
        printer.print_indent();
        printer.write("}");
        Ok(())
    }
}

impl ModuleOp {
    /// Create a module holding `ops`, which must all be functions with
    /// distinct names.
    pub fn new(location: Location, sym_name: Option<String>, ops: Vec<AnyOp>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut body = Block::default();
        for op in ops {
            match op.as_func() {
                Some(func) => {
                    if !names.insert(func.sym_name().to_string()) {
                        let msg = format!("redefinition of symbol @{}", func.sym_name());
                        return Err(Error::verification(op.location(), msg));
                    }
                }
                None => {
                    let msg = format!(
                        "'{}' op is not allowed at module level; expected a function",
                        op.name()
                    );
                    return Err(Error::verification(op.location(), msg));
                }
            }
            body.push(op);
        }
        let operation = Operation::new(location, Self::operation_name()).with_blocks(vec![body]);
        Ok(ModuleOp {
            operation,
            sym_name,
        })
    }
    pub fn from_functions(functions: Vec<FuncOp>) -> Result<Self> {
        let ops = functions.into_iter().map(AnyOp::from).collect();
        ModuleOp::new(Location::Unknown, None, ops)
    }
    pub fn sym_name(&self) -> Option<&str> {
        self.sym_name.as_deref()
    }
    pub fn body(&self) -> &Block {
        // Set by the constructor.
        &self.operation.blocks()[0]
    }
    pub fn functions(&self) -> impl Iterator<Item = &FuncOp> {
        self.body().ops().iter().filter_map(AnyOp::as_func)
    }
    pub fn lookup(&self, name: &str) -> Option<&FuncOp> {
        self.functions().find(|func| func.sym_name() == name)
    }
    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }
    pub fn print(&self, printer: &mut Printer) -> Result<()> {
        printer.print_indent();
        printer.write(self.operation.name().as_str());
        self.print_format(printer)?;
        printer.newline();
        Ok(())
    }
    /// Whether both modules contain the same IR, ignoring value identities.
    pub fn structurally_eq(&self, other: &ModuleOp) -> bool {
        self.sym_name == other.sym_name
            && self.body().ops().len() == other.body().ops().len()
            && self
                .body()
                .ops()
                .iter()
                .zip(other.body().ops())
                .all(|(a, b)| a.structurally_eq(b))
    }
}

impl Display for ModuleOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut printer = Printer::new();
        printer
            .print_module(self)
            .map_err(|_| std::fmt::Error)?;
        write!(f, "{}", printer.finish())
    }
}

impl Parser {
    /// Parse `module @name? { func* } loc?` or a list of bare functions.
    pub fn parse_module(&mut self) -> Result<ModuleOp> {
        if !self.check_lexeme(TokenKind::BareIdentifier, "module") {
            debug!("Parsing implicit module");
            let ops = self.parse_module_body()?;
            return ModuleOp::new(Location::Unknown, None, ops);
        }
        self.advance();
        let sym_name = if self.check(TokenKind::AtIdentifier) {
            Some(self.advance().lexeme[1..].to_string())
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;
        let ops = self.parse_module_body()?;
        self.expect(TokenKind::RBrace)?;
        let location = self.parse_trailing_location()?;
        ModuleOp::new(location, sym_name, ops)
    }
    fn parse_module_body(&mut self) -> Result<Vec<AnyOp>> {
        self.declare_functions()?;
        let mut ops = vec![];
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            ops.push(self.parse_op()?);
        }
        Ok(ops)
    }
    /// Register the signature of every function in the module body before
    /// any body is parsed, so calls can refer to functions further down.
    fn declare_functions(&mut self) -> Result<()> {
        let start = self.checkpoint();
        let mut seen = HashSet::new();
        let mut depth = 0usize;
        loop {
            let token = self.current_token().clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                TokenKind::BareIdentifier if depth == 0 && FuncOp::is_mnemonic(&token.lexeme) => {
                    self.advance();
                    let header = self.parse_func_header()?;
                    if !seen.insert(header.sym_name.clone()) {
                        let msg = format!("redefinition of symbol @{}", header.sym_name);
                        return Err(Error::verification(&self.location_of(&token), msg));
                    }
                    self.define_function(&token, &header.sym_name, header.function_type)?;
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
        self.rewind(start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_module() {
        let module = Parser::parse("module {\n}").unwrap();
        assert!(module.is_empty());
        assert_eq!(module.to_string(), "module {\n}\n");

        let module = Parser::parse("module @m {\n} loc(unknown)").unwrap();
        assert_eq!(module.sym_name(), Some("m"));
        assert_eq!(module.to_string(), "module @m {\n}\n");

        let module = Parser::parse("").unwrap();
        assert!(module.is_empty());
    }

    #[test]
    fn forward_call() {
        let src = indoc! {r#"
        module {
          func @main() {
            %0 = toy.generic_call @later() : () -> tensor<*xf64> loc(unknown)
            toy.print %0 : tensor<*xf64> loc(unknown)
            toy.return loc(unknown)
          } loc(unknown)
          func @later() -> tensor<*xf64> {
            %0 = toy.constant dense<1.0> : tensor<*xf64> loc(unknown)
            toy.return %0 : tensor<*xf64> loc(unknown)
          } loc(unknown)
        }
        "#};
        let module = Parser::parse(src).unwrap();
        let names: Vec<&str> = module.functions().map(|f| f.sym_name()).collect();
        assert_eq!(names, vec!["main", "later"]);
        assert!(module.lookup("later").is_some());
        assert!(module.lookup("missing").is_none());
        assert_eq!(module.to_string(), src);
    }

    #[test]
    fn duplicate_function() {
        let src = indoc! {r#"
        func @f() {
        } loc(unknown)
        func @f() {
        } loc(unknown)
        "#};
        let err = Parser::parse(src).unwrap_err();
        assert!(err.is_verification(), "{err}");
        assert!(err.to_string().contains("redefinition of symbol @f"));
    }
}
