//! Textual output of the IR.
//!
//! Values have no names in memory, so the printer hands them out while it
//! walks the IR. Results are named `%0`, `%1`, and so on in definition order
//! and function arguments are named `%arg0`, `%arg1`, and so on. Functions
//! are isolated, so numbering starts again at zero in every function.
use crate::ir::AnyOp;
use crate::ir::Block;
use crate::ir::Location;
use crate::ir::ModuleOp;
use crate::ir::Type;
use crate::ir::Value;
use crate::scope::ScopedMap;
use crate::scope::SymbolTable;
use crate::Error;
use crate::Result;
use tracing::debug;

#[derive(Default)]
pub struct Printer {
    out: String,
    indent: usize,
    names: ScopedMap<Value, String>,
    used: SymbolTable<Value>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }
    pub fn newline(&mut self) {
        self.out.push('\n');
    }
    pub fn print_indent(&mut self) {
        self.out.push_str(&crate::ir::spaces(self.indent));
    }
    pub fn print_type(&mut self, typ: &Type) {
        self.out.push_str(&typ.to_string());
    }
    pub fn enter_scope(&mut self) {
        self.names.push();
        self.used.push();
        self.indent += 1;
    }
    /// Enter a scope where the names of the enclosing scopes can be reused.
    pub fn enter_isolated_scope(&mut self) {
        self.names.push_isolated();
        self.used.push_isolated();
        self.indent += 1;
    }
    pub fn leave_scope(&mut self) {
        self.names.pop();
        self.used.pop();
        self.indent = self.indent.saturating_sub(1);
    }
    /// First `{prefix}{n}` that is free in the current scope.
    pub fn next_unused_symbol(&self, prefix: &str) -> String {
        self.used.next_unused_symbol(prefix)
    }
    pub fn insert_value_name(&mut self, value: &Value, name: &str) {
        self.names.insert(value.clone(), name.to_string());
        self.used.insert(name.to_string(), value.clone());
    }
    /// Name `value` with the next free `{prefix}{n}` and return the name.
    pub fn insert_value_and_generate_name(&mut self, value: &Value, prefix: &str) -> String {
        let name = self.next_unused_symbol(prefix);
        self.insert_value_name(value, &name);
        name
    }
    pub fn lookup_value_name(&self, value: &Value) -> Result<String> {
        match self.names.lookup(value) {
            Some(name) => Ok(name.clone()),
            // Printing only sees values that the op constructors accepted, so
            // this means the value was defined outside the printed IR.
            None => Err(Error::unresolved(&Location::Unknown, format!("{value:?}"))),
        }
    }
    pub fn print_operand(&mut self, value: &Value) -> Result<()> {
        let name = self.lookup_value_name(value)?;
        self.write(&name);
        Ok(())
    }
    /// Print `%a, %b` without the types.
    pub fn print_operands(&mut self, values: &[Value]) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            if 0 < i {
                self.write(", ");
            }
            self.print_operand(value)?;
        }
        Ok(())
    }
    /// Print `result names = mnemonic format loc(...)`.
    ///
    /// Results are named after the format is printed, so an op can never
    /// refer to its own results.
    pub fn print_op(&mut self, op: &AnyOp) -> Result<()> {
        let operation = op.operation();
        let mut names = vec![];
        for _ in operation.results() {
            names.push(self.next_unused_symbol_after(&names));
        }
        if !names.is_empty() {
            self.write(&format!("{} = ", names.join(", ")));
        }
        self.write(operation.name().as_str());
        op.as_op().print_format(self)?;
        self.write(&format!(" {}", operation.location()));
        for (value, name) in operation.results().iter().zip(&names) {
            self.insert_value_name(value, name);
        }
        Ok(())
    }
    fn next_unused_symbol_after(&self, taken: &[String]) -> String {
        let mut index = 0;
        loop {
            let name = format!("%{index}");
            if self.used.lookup(&name).is_none() && !taken.contains(&name) {
                return name;
            }
            index += 1;
        }
    }
    /// Print every op of the block on its own line at the current indent.
    pub fn print_block(&mut self, block: &Block) -> Result<()> {
        for op in block.ops() {
            self.print_indent();
            self.print_op(op)?;
            self.newline();
        }
        Ok(())
    }
    pub fn print_module(&mut self, module: &ModuleOp) -> Result<()> {
        debug!("Printing module with {} function(s)", module.functions().count());
        module.print(self)
    }
    pub fn finish(self) -> String {
        self.out
    }
}
