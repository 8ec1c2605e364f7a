use crate::ir::get_kind;
use crate::ir::AnyOp;
use crate::ir::Block;
use crate::ir::FunctionType;
use crate::ir::Location;
use crate::ir::Op;
use crate::ir::Operation;
use crate::ir::OperationName;
use crate::ir::Type;
use crate::ir::Value;
use crate::parser::Parse;
use crate::parser::Parser;
use crate::parser::Token;
use crate::parser::TokenKind;
use crate::printer::Printer;
use crate::Error;
use crate::Result;
use std::collections::HashSet;
use tracing::debug;

/// `func`
///
/// A named function with a body. The body is isolated from above: it can
/// only use its own arguments and the values defined inside it.
///
/// ```ebnf
/// `func` `@` $sym_name `(` ($arg `:` $type $loc?)* `)` (`->` $outputs)? `{`
///   $body
/// `}` $loc
/// ```
///
/// For example,
/// ```mlir
/// func @multiply_transpose(%arg0: tensor<*xf64>, %arg1: tensor<*xf64>) -> tensor<*xf64> {
///   %0 = toy.transpose(%arg0 : tensor<*xf64>) to tensor<*xf64> loc(unknown)
///   toy.return %0 : tensor<*xf64> loc(unknown)
/// } loc(unknown)
/// ```
#[derive(Debug)]
pub struct FuncOp {
    operation: Operation,
    sym_name: String,
    function_type: FunctionType,
    argument_locations: Vec<Option<Location>>,
}

impl Op for FuncOp {
    fn operation_name() -> OperationName {
        OperationName::new("func".to_string())
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn is_func(&self) -> bool {
        true
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        printer.write(&format!(" @{}(", self.sym_name));
        printer.enter_isolated_scope();
        let arguments = self.body().arguments();
        for (i, (argument, location)) in arguments.iter().zip(&self.argument_locations).enumerate() {
            if 0 < i {
                printer.write(", ");
            }
            let name = printer.insert_value_and_generate_name(argument, "%arg");
            printer.write(&format!("{name}: {}", argument.typ()));
            if let Some(location) = location {
                printer.write(&format!(" {location}"));
            }
        }
        printer.write(")");
        let outputs = self.function_type.outputs();
        match outputs.len() {
            0 => {}
            1 => printer.write(&format!(" -> {}", outputs[0])),
            _ => {
                let outputs: Vec<String> = outputs.iter().map(|t| t.to_string()).collect();
                printer.write(&format!(" -> ({})", outputs.join(", ")));
            }
        }
        printer.write(" {");
        printer.newline();
        printer.print_block(self.body())?;
        printer.leave_scope();
        printer.print_indent();
        printer.write("}");
        Ok(())
    }
}

impl FuncOp {
    pub fn new(
        location: Location,
        sym_name: &str,
        function_type: FunctionType,
        body: Block,
    ) -> Result<Self> {
        let argument_locations = vec![None; body.arguments().len()];
        FuncOp::with_argument_locations(location, sym_name, function_type, argument_locations, body)
    }
    /// Like [FuncOp::new], but with a location per argument.
    pub fn with_argument_locations(
        location: Location,
        sym_name: &str,
        function_type: FunctionType,
        argument_locations: Vec<Option<Location>>,
        body: Block,
    ) -> Result<Self> {
        verify_signature(&location, sym_name, &function_type, &body)?;
        if argument_locations.len() != body.arguments().len() {
            let msg = format!(
                "'func' op @{sym_name} has {} argument locations for {} arguments",
                argument_locations.len(),
                body.arguments().len()
            );
            return Err(Error::verification(&location, msg));
        }
        verify_isolation(sym_name, &body)?;
        verify_returns(&location, sym_name, &function_type, &body)?;
        let operation = Operation::new(location, Self::operation_name()).with_blocks(vec![body]);
        Ok(FuncOp {
            operation,
            sym_name: sym_name.to_string(),
            function_type,
            argument_locations,
        })
    }
    /// Whether `mnemonic` refers to this op, possibly through an alias.
    pub fn is_mnemonic(mnemonic: &str) -> bool {
        get_kind(mnemonic)
            .map(|kind| *kind.name() == Self::operation_name())
            .unwrap_or(false)
    }
    pub fn sym_name(&self) -> &str {
        &self.sym_name
    }
    pub fn function_type(&self) -> &FunctionType {
        &self.function_type
    }
    pub fn body(&self) -> &Block {
        // Set by the constructor.
        &self.operation.blocks()[0]
    }
    pub fn arguments(&self) -> &[Value] {
        self.body().arguments()
    }
    pub fn argument_locations(&self) -> &[Option<Location>] {
        &self.argument_locations
    }
}

fn verify_signature(
    location: &Location,
    sym_name: &str,
    function_type: &FunctionType,
    body: &Block,
) -> Result<()> {
    let inputs = function_type.inputs();
    let arguments = body.arguments();
    if inputs.len() != arguments.len() {
        let msg = format!(
            "'func' op @{sym_name} has {} arguments, but its type has {} inputs",
            arguments.len(),
            inputs.len()
        );
        return Err(Error::verification(location, msg));
    }
    for (i, (argument, input)) in arguments.iter().zip(inputs).enumerate() {
        if argument.typ() != input {
            let msg = format!(
                "'func' op @{sym_name} argument #{i} has type {}, but its type says {input}",
                argument.typ()
            );
            return Err(Error::verification(location, msg));
        }
    }
    Ok(())
}

/// Check that every operand is an argument or defined earlier in the body.
fn verify_isolation(sym_name: &str, body: &Block) -> Result<()> {
    fn walk(sym_name: &str, block: &Block, defined: &mut HashSet<Value>) -> Result<()> {
        defined.extend(block.arguments().iter().cloned());
        for op in block.ops() {
            // Nested functions were verified on their own.
            if op.as_op().is_func() {
                continue;
            }
            for operand in op.operation().operands() {
                if !defined.contains(operand) {
                    let msg = format!(
                        "'{}' op in @{sym_name} uses a value that is not defined above it",
                        op.name()
                    );
                    return Err(Error::verification(op.location(), msg));
                }
            }
            for nested in op.operation().blocks() {
                walk(sym_name, nested, &mut defined.clone())?;
            }
            defined.extend(op.operation().results().iter().cloned());
        }
        Ok(())
    }
    walk(sym_name, body, &mut HashSet::new())
}

fn verify_returns(
    location: &Location,
    sym_name: &str,
    function_type: &FunctionType,
    body: &Block,
) -> Result<()> {
    let outputs = function_type.outputs();
    let count = body.ops().len();
    for (i, op) in body.ops().iter().enumerate() {
        let AnyOp::Return(ret) = op else {
            continue;
        };
        if i + 1 != count {
            let msg = format!("'toy.return' op must be the last op in @{sym_name}");
            return Err(Error::verification(op.location(), msg));
        }
        let operands = ret.operation().operands();
        if operands.len() != outputs.len() {
            let msg = format!(
                "'toy.return' op has {} operand(s), but @{sym_name} returns {}",
                operands.len(),
                outputs.len()
            );
            return Err(Error::verification(op.location(), msg));
        }
        for (operand, output) in operands.iter().zip(outputs) {
            if !operand.typ().is_subtype_of(output) {
                let msg = format!(
                    "'toy.return' op returns {}, which is not a subtype of {output} in @{sym_name}",
                    operand.typ()
                );
                return Err(Error::verification(op.location(), msg));
            }
        }
    }
    if !outputs.is_empty() && !body.has_terminator() {
        let msg = format!(
            "@{sym_name} returns {} value(s), but has no 'toy.return'",
            outputs.len()
        );
        return Err(Error::verification(location, msg));
    }
    Ok(())
}

/// Everything in a function header up to the `{`.
pub struct FuncHeader {
    pub sym_name: String,
    pub function_type: FunctionType,
    /// Name token, type, and optional location per argument.
    pub arguments: Vec<(Token, Type, Option<Location>)>,
}

impl Parser {
    /// Parse `@name(%a: t loc?, ...) (-> outputs)?`.
    pub fn parse_func_header(&mut self) -> Result<FuncHeader> {
        let identifier = self.expect(TokenKind::AtIdentifier)?;
        let sym_name = identifier.lexeme[1..].to_string();
        self.expect(TokenKind::LParen)?;
        let mut arguments = vec![];
        while !self.check(TokenKind::RParen) {
            if !arguments.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            let name = self.expect(TokenKind::PercentIdentifier)?;
            self.expect(TokenKind::Colon)?;
            let typ = self.parse_type()?;
            let location = self.parse_optional_location()?;
            arguments.push((name, typ, location));
        }
        self.expect(TokenKind::RParen)?;
        let outputs = if self.check(TokenKind::Arrow) {
            self.advance();
            self.parse_function_outputs()?
        } else {
            vec![]
        };
        let inputs = arguments.iter().map(|(_, typ, _)| typ.clone()).collect();
        Ok(FuncHeader {
            sym_name,
            function_type: FunctionType::new(inputs, outputs),
            arguments,
        })
    }
}

impl Parse for FuncOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let identifier = parser.current_token().clone();
        let header = parser.parse_func_header()?;
        debug!("Parsing function @{}", header.sym_name);
        parser.define_function(&identifier, &header.sym_name, header.function_type.clone())?;
        parser.expect(TokenKind::LBrace)?;
        let mut body = Block::new(header.function_type.inputs().to_vec());
        parser.enter_isolated_scope();
        for ((name, _, _), argument) in header.arguments.iter().zip(body.arguments()) {
            parser.define_var(&name.lexeme, argument.clone())?;
        }
        let ops = parser.parse_ops_until_rbrace()?;
        parser.expect(TokenKind::RBrace)?;
        parser.leave_scope();
        let location = parser.parse_trailing_location()?;
        for op in ops {
            body.push(op);
        }
        let argument_locations = header.arguments.into_iter().map(|(_, _, loc)| loc).collect();
        let op = FuncOp::with_argument_locations(
            location,
            &header.sym_name,
            header.function_type,
            argument_locations,
            body,
        )?;
        Ok(op.into())
    }
}
