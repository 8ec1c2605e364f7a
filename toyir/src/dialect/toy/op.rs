use crate::ir::AnyOp;
use crate::ir::DenseAttr;
use crate::ir::FunctionType;
use crate::ir::Location;
use crate::ir::Op;
use crate::ir::Operation;
use crate::ir::OperationName;
use crate::ir::Type;
use crate::ir::Value;
use crate::parser::Parse;
use crate::parser::Parser;
use crate::parser::TokenKind;
use crate::printer::Printer;
use crate::Error;
use crate::Result;

fn name(mnemonic: &str) -> OperationName {
    OperationName::new(format!("toy.{mnemonic}"))
}

fn verify_f64_tensor(location: &Location, op: &str, what: &str, typ: &Type) -> Result<()> {
    if typ.is_subtype_of(&Type::f64_tensor()) {
        Ok(())
    } else {
        let msg = format!("'{op}' op expects {what} to be a tensor of f64, but got {typ}");
        Err(Error::verification(location, msg))
    }
}

/// `toy.constant`
///
/// Materializes a dense f64 literal as a tensor.
///
/// ```ebnf
/// $result `=` `toy.constant` `dense<` $values `>` `:` $type $loc
/// ```
///
/// For example,
/// ```mlir
/// %0 = toy.constant dense<[1.0,2.0,3.0,4.0]> : tensor<2x2xf64> loc(unknown)
/// ```
#[derive(Debug)]
pub struct ConstantOp {
    operation: Operation,
    value: DenseAttr,
}

impl Op for ConstantOp {
    fn operation_name() -> OperationName {
        name("constant")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        printer.write(&format!(" {} : {}", self.value, self.value.typ()));
        Ok(())
    }
}

impl ConstantOp {
    /// The result type follows from the literal; scalars produce
    /// `tensor<*xf64>`.
    pub fn new(location: Location, value: DenseAttr) -> Result<Self> {
        match value.expected_len() {
            Some(len) if len == value.values().len() => {}
            _ => {
                let msg = format!(
                    "'toy.constant' op has {} values, which does not fit shape {:?}",
                    value.values().len(),
                    value.shape()
                );
                return Err(Error::verification(&location, msg));
            }
        }
        let operation = Operation::new(location, Self::operation_name())
            .with_result_types(vec![value.typ()]);
        Ok(ConstantOp { operation, value })
    }
    pub fn value(&self) -> &DenseAttr {
        &self.value
    }
}

impl Parse for ConstantOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let values = parser.parse_dense_values()?;
        parser.expect(TokenKind::Colon)?;
        let type_token = parser.current_token().clone();
        let typ = parser.parse_type()?;
        let location = parser.parse_trailing_location()?;
        let shape = match &typ {
            Type::RankedTensor { element, shape }
                if **element == Type::F64 && shape.iter().all(|dim| 0 <= *dim) =>
            {
                shape.clone()
            }
            Type::Tensor(element) if **element == Type::F64 => vec![],
            _ => {
                let msg = format!(
                    "'toy.constant' op expects a static tensor of f64, but got {typ}"
                );
                let location = parser.location_of(&type_token);
                return Err(Error::verification(&location, msg));
            }
        };
        let op = ConstantOp::new(location, DenseAttr::new(shape, values))?;
        Ok(op.into())
    }
}

fn binary_operation(
    name: OperationName,
    location: Location,
    lhs: Value,
    rhs: Value,
    result_type: Type,
) -> Result<Operation> {
    let op = name.to_string();
    verify_f64_tensor(&location, &op, "the left operand", lhs.typ())?;
    verify_f64_tensor(&location, &op, "the right operand", rhs.typ())?;
    verify_f64_tensor(&location, &op, "the result", &result_type)?;
    Ok(Operation::new(location, name)
        .with_operands(vec![lhs, rhs])
        .with_result_types(vec![result_type]))
}

fn print_binary(operation: &Operation, printer: &mut Printer) -> Result<()> {
    printer.write(" ");
    printer.print_operands(operation.operands())?;
    printer.write(" : ");
    printer.print_type(operation.results()[0].typ());
    Ok(())
}

/// Parse `%lhs, %rhs : type loc?`.
fn parse_binary(parser: &mut Parser) -> Result<(Value, Value, Type, Location)> {
    let lhs = parser.parse_operand()?;
    parser.expect(TokenKind::Comma)?;
    let rhs = parser.parse_operand()?;
    parser.expect(TokenKind::Colon)?;
    let typ = parser.parse_type()?;
    let location = parser.parse_trailing_location()?;
    Ok((lhs, rhs, typ, location))
}

/// `toy.add`
///
/// Element-wise addition of two tensors.
///
/// ```ebnf
/// $result `=` `toy.add` $lhs `,` $rhs `:` $type $loc
/// ```
#[derive(Debug)]
pub struct AddOp {
    operation: Operation,
}

impl Op for AddOp {
    fn operation_name() -> OperationName {
        name("add")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        print_binary(&self.operation, printer)
    }
}

impl AddOp {
    /// Add with an unranked result.
    pub fn new(location: Location, lhs: Value, rhs: Value) -> Result<Self> {
        AddOp::with_result_type(location, lhs, rhs, Type::f64_tensor())
    }
    pub fn with_result_type(location: Location, lhs: Value, rhs: Value, typ: Type) -> Result<Self> {
        let operation = binary_operation(Self::operation_name(), location, lhs, rhs, typ)?;
        Ok(AddOp { operation })
    }
    pub fn lhs(&self) -> &Value {
        &self.operation.operands()[0]
    }
    pub fn rhs(&self) -> &Value {
        &self.operation.operands()[1]
    }
}

impl Parse for AddOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let (lhs, rhs, typ, location) = parse_binary(parser)?;
        Ok(AddOp::with_result_type(location, lhs, rhs, typ)?.into())
    }
}

/// `toy.mul`
///
/// Element-wise multiplication of two tensors.
///
/// ```ebnf
/// $result `=` `toy.mul` $lhs `,` $rhs `:` $type $loc
/// ```
#[derive(Debug)]
pub struct MulOp {
    operation: Operation,
}

impl Op for MulOp {
    fn operation_name() -> OperationName {
        name("mul")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        print_binary(&self.operation, printer)
    }
}

impl MulOp {
    /// Multiply with an unranked result.
    pub fn new(location: Location, lhs: Value, rhs: Value) -> Result<Self> {
        MulOp::with_result_type(location, lhs, rhs, Type::f64_tensor())
    }
    pub fn with_result_type(location: Location, lhs: Value, rhs: Value, typ: Type) -> Result<Self> {
        let operation = binary_operation(Self::operation_name(), location, lhs, rhs, typ)?;
        Ok(MulOp { operation })
    }
    pub fn lhs(&self) -> &Value {
        &self.operation.operands()[0]
    }
    pub fn rhs(&self) -> &Value {
        &self.operation.operands()[1]
    }
}

impl Parse for MulOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let (lhs, rhs, typ, location) = parse_binary(parser)?;
        Ok(MulOp::with_result_type(location, lhs, rhs, typ)?.into())
    }
}

/// `toy.generic_call`
///
/// Calls a function in the same module. The results are the outputs of the
/// callee.
///
/// ```ebnf
/// $results `=` `toy.generic_call` `@` $callee `(` $inputs `)` `:` $function_type $loc
/// ```
///
/// For example,
/// ```mlir
/// %2 = toy.generic_call @multiply_transpose(%0, %1) : (tensor<2x3xf64>, tensor<2x3xf64>) -> tensor<*xf64> loc(unknown)
/// ```
#[derive(Debug)]
pub struct GenericCallOp {
    operation: Operation,
    callee: String,
}

impl Op for GenericCallOp {
    fn operation_name() -> OperationName {
        name("generic_call")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        printer.write(&format!(" @{}(", self.callee));
        printer.print_operands(self.operation.operands())?;
        let typ = FunctionType::new(
            crate::ir::types_of(self.operation.operands()),
            self.operation.result_types(),
        );
        printer.write(&format!(") : {typ}"));
        Ok(())
    }
}

impl GenericCallOp {
    /// Call `callee`, whose signature is `callee_type`, with `inputs`.
    pub fn new(
        location: Location,
        callee: &str,
        callee_type: &FunctionType,
        inputs: Vec<Value>,
    ) -> Result<Self> {
        let expected = callee_type.inputs();
        if inputs.len() != expected.len() {
            let msg = format!(
                "'toy.generic_call' op passes {} operand(s) to @{callee}, which takes {}",
                inputs.len(),
                expected.len()
            );
            return Err(Error::verification(&location, msg));
        }
        for (i, (input, declared)) in inputs.iter().zip(expected).enumerate() {
            if !input.typ().is_subtype_of(declared) {
                let msg = format!(
                    "'toy.generic_call' op operand #{i} has type {}, but @{callee} takes {declared}",
                    input.typ()
                );
                return Err(Error::verification(&location, msg));
            }
        }
        let operation = Operation::new(location, Self::operation_name())
            .with_operands(inputs)
            .with_result_types(callee_type.outputs().to_vec());
        Ok(GenericCallOp {
            operation,
            callee: callee.to_string(),
        })
    }
    pub fn callee(&self) -> &str {
        &self.callee
    }
}

impl Parse for GenericCallOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let identifier = parser.expect(TokenKind::AtIdentifier)?;
        let callee = identifier.lexeme[1..].to_string();
        let callee_type = match parser.lookup_function(&callee) {
            Some(typ) => typ.clone(),
            None => {
                let location = parser.location_of(&identifier);
                return Err(Error::unresolved(&location, identifier.lexeme.clone()));
            }
        };
        parser.expect(TokenKind::LParen)?;
        let inputs = parser.parse_operand_list(TokenKind::RParen)?;
        parser.expect(TokenKind::RParen)?;
        parser.expect(TokenKind::Colon)?;
        let type_token = parser.current_token().clone();
        let printed = parser.parse_function_type()?;
        let location = parser.parse_trailing_location()?;
        let op = GenericCallOp::new(location, &callee, &callee_type, inputs)?;
        let operand_types = crate::ir::types_of(op.operation.operands());
        if printed.inputs() != operand_types.as_slice()
            || printed.outputs() != callee_type.outputs()
        {
            let actual = FunctionType::new(operand_types, callee_type.outputs().to_vec());
            let msg = format!(
                "'toy.generic_call' op has type {printed}, but the call to @{callee} has type {actual}"
            );
            return Err(Error::verification(&parser.location_of(&type_token), msg));
        }
        Ok(op.into())
    }
}

/// `toy.reshape`
///
/// Reinterprets a ranked tensor with a new static shape.
///
/// ```ebnf
/// $result `=` `toy.reshape` `(` $input `:` $type `)` `to` $result_type $loc
/// ```
#[derive(Debug)]
pub struct ReshapeOp {
    operation: Operation,
}

impl Op for ReshapeOp {
    fn operation_name() -> OperationName {
        name("reshape")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        print_unary_to(&self.operation, printer)
    }
}

impl ReshapeOp {
    pub fn new(location: Location, input: Value, result_type: Type) -> Result<Self> {
        let op = "toy.reshape";
        verify_f64_tensor(&location, op, "the operand", input.typ())?;
        verify_f64_tensor(&location, op, "the result", &result_type)?;
        if !input.typ().is_ranked_tensor() {
            let msg = format!("'{op}' op expects a ranked operand, but got {}", input.typ());
            return Err(Error::verification(&location, msg));
        }
        if !result_type.is_ranked_tensor() {
            let msg = format!("'{op}' op expects a ranked result type, but got {result_type}");
            return Err(Error::verification(&location, msg));
        }
        for typ in [input.typ(), &result_type] {
            if typ.has_static_shape() && typ.num_elements().is_none() {
                let msg = format!("'{op}' op type {typ} has too many elements");
                return Err(Error::verification(&location, msg));
            }
        }
        if let (Some(from), Some(to)) = (input.typ().num_elements(), result_type.num_elements()) {
            if from != to {
                let msg = format!(
                    "'{op}' op cannot reshape {} ({from} elements) to {result_type} ({to} elements)",
                    input.typ()
                );
                return Err(Error::verification(&location, msg));
            }
        }
        let operation = Operation::new(location, Self::operation_name())
            .with_operands(vec![input])
            .with_result_types(vec![result_type]);
        Ok(ReshapeOp { operation })
    }
    pub fn input(&self) -> &Value {
        &self.operation.operands()[0]
    }
}

impl Parse for ReshapeOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let (input, typ, location) = parse_unary_to(parser)?;
        Ok(ReshapeOp::new(location, input, typ)?.into())
    }
}

/// Print ` (%x : type) to result_type`.
fn print_unary_to(operation: &Operation, printer: &mut Printer) -> Result<()> {
    let input = &operation.operands()[0];
    printer.write("(");
    printer.print_operand(input)?;
    printer.write(&format!(" : {}) to {}", input.typ(), operation.results()[0].typ()));
    Ok(())
}

/// Parse `(%x : type) to result_type loc?`.
fn parse_unary_to(parser: &mut Parser) -> Result<(Value, Type, Location)> {
    parser.expect(TokenKind::LParen)?;
    let input = parser.parse_typed_operand()?;
    parser.expect(TokenKind::RParen)?;
    parser.expect_lexeme(TokenKind::BareIdentifier, "to")?;
    let typ = parser.parse_type()?;
    let location = parser.parse_trailing_location()?;
    Ok((input, typ, location))
}

/// `toy.transpose`
///
/// Swaps the last two dimensions of a tensor. Unranked tensors stay
/// unranked.
///
/// ```ebnf
/// $result `=` `toy.transpose` `(` $input `:` $type `)` `to` $result_type $loc
/// ```
#[derive(Debug)]
pub struct TransposeOp {
    operation: Operation,
}

impl Op for TransposeOp {
    fn operation_name() -> OperationName {
        name("transpose")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        print_unary_to(&self.operation, printer)
    }
}

impl TransposeOp {
    /// Transpose with the result type derived from the operand.
    pub fn new(location: Location, input: Value) -> Result<Self> {
        verify_f64_tensor(&location, "toy.transpose", "the operand", input.typ())?;
        let typ = TransposeOp::transposed(input.typ());
        TransposeOp::with_result_type(location, input, typ)
    }
    /// Transpose with a declared result type, which must be a supertype of
    /// the derived one.
    pub fn with_result_type(location: Location, input: Value, typ: Type) -> Result<Self> {
        verify_f64_tensor(&location, "toy.transpose", "the operand", input.typ())?;
        let derived = TransposeOp::transposed(input.typ());
        if !derived.is_subtype_of(&typ) {
            let msg = format!(
                "'toy.transpose' op of {} gives {derived}, which is not a subtype of {typ}",
                input.typ()
            );
            return Err(Error::verification(&location, msg));
        }
        let operation = Operation::new(location, Self::operation_name())
            .with_operands(vec![input])
            .with_result_types(vec![typ]);
        Ok(TransposeOp { operation })
    }
    pub fn input(&self) -> &Value {
        &self.operation.operands()[0]
    }
    /// Type of the transpose of a tensor of type `typ`.
    pub fn transposed(typ: &Type) -> Type {
        match typ {
            Type::RankedTensor { element, shape } if 2 <= shape.len() => {
                let mut shape = shape.clone();
                let rank = shape.len();
                shape.swap(rank - 2, rank - 1);
                Type::RankedTensor {
                    element: element.clone(),
                    shape,
                }
            }
            _ => typ.clone(),
        }
    }
}

impl Parse for TransposeOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let (input, typ, location) = parse_unary_to(parser)?;
        Ok(TransposeOp::with_result_type(location, input, typ)?.into())
    }
}

/// `toy.print`
///
/// ```ebnf
/// `toy.print` $input `:` $type $loc
/// ```
#[derive(Debug)]
pub struct PrintOp {
    operation: Operation,
}

impl Op for PrintOp {
    fn operation_name() -> OperationName {
        name("print")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        let input = &self.operation.operands()[0];
        printer.write(" ");
        printer.print_operand(input)?;
        printer.write(&format!(" : {}", input.typ()));
        Ok(())
    }
}

impl PrintOp {
    pub fn new(location: Location, input: Value) -> Result<Self> {
        verify_f64_tensor(&location, "toy.print", "the operand", input.typ())?;
        let operation = Operation::new(location, Self::operation_name()).with_operands(vec![input]);
        Ok(PrintOp { operation })
    }
    pub fn input(&self) -> &Value {
        &self.operation.operands()[0]
    }
}

impl Parse for PrintOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let input = parser.parse_typed_operand()?;
        let location = parser.parse_trailing_location()?;
        Ok(PrintOp::new(location, input)?.into())
    }
}

/// `toy.return`
///
/// Ends a function, optionally returning one value.
///
/// ```ebnf
/// `toy.return` ($input `:` $type)? $loc
/// ```
#[derive(Debug)]
pub struct ReturnOp {
    operation: Operation,
}

impl Op for ReturnOp {
    fn operation_name() -> OperationName {
        name("return")
    }
    fn operation(&self) -> &Operation {
        &self.operation
    }
    fn is_terminator(&self) -> bool {
        true
    }
    fn print_format(&self, printer: &mut Printer) -> Result<()> {
        if let Some(input) = self.input() {
            printer.write(" ");
            printer.print_operand(input)?;
            printer.write(&format!(" : {}", input.typ()));
        }
        Ok(())
    }
}

impl ReturnOp {
    pub fn new(location: Location, input: Option<Value>) -> Result<Self> {
        let operands = input.into_iter().collect();
        let operation = Operation::new(location, Self::operation_name()).with_operands(operands);
        Ok(ReturnOp { operation })
    }
    pub fn input(&self) -> Option<&Value> {
        self.operation.operand(0)
    }
}

impl Parse for ReturnOp {
    fn op(parser: &mut Parser) -> Result<AnyOp> {
        let input = if parser.check(TokenKind::PercentIdentifier) {
            Some(parser.parse_typed_operand()?)
        } else {
            None
        };
        let location = parser.parse_trailing_location()?;
        Ok(ReturnOp::new(location, input)?.into())
    }
}
