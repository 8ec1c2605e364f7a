use crate::dialect::func::FuncDialect;
use crate::dialect::toy::ToyDialect;
use crate::ir::AnyOp;
use crate::ir::Op;
use crate::ir::OperationName;
use crate::parser::Parse;
use crate::parser::Parser;
use crate::Dialect;
use crate::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::OnceLock;
use tracing::debug;

type ParseFn = fn(&mut Parser) -> Result<AnyOp>;

/// Describes one op kind: its canonical name and how to parse it.
#[derive(Clone)]
pub struct KindDescriptor {
    name: OperationName,
    parse: ParseFn,
}

impl KindDescriptor {
    pub fn of<O: Op + Parse>() -> Self {
        KindDescriptor {
            name: O::operation_name(),
            parse: O::op,
        }
    }
    pub fn name(&self) -> &OperationName {
        &self.name
    }
    pub fn parse(&self, parser: &mut Parser) -> Result<AnyOp> {
        (self.parse)(parser)
    }
}

impl Debug for KindDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "KindDescriptor({})", self.name)
    }
}

/// Mnemonic to op kind lookup table.
#[derive(Debug, Default)]
pub struct OpRegistry {
    kinds: HashMap<String, KindDescriptor>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_dialects(dialects: &[&dyn Dialect]) -> Self {
        let mut registry = OpRegistry::new();
        for dialect in dialects {
            debug!("Registering dialect {}", dialect.name());
            dialect.register(&mut registry);
        }
        registry
    }
    /// Register `O` under its canonical name.
    pub fn register<O: Op + Parse>(&mut self) {
        let descriptor = KindDescriptor::of::<O>();
        let name = descriptor.name().to_string();
        self.insert(&name, descriptor);
    }
    /// Register `O` under an additional mnemonic.
    pub fn register_alias<O: Op + Parse>(&mut self, alias: &str) {
        self.insert(alias, KindDescriptor::of::<O>());
    }
    fn insert(&mut self, mnemonic: &str, descriptor: KindDescriptor) {
        let previous = self.kinds.insert(mnemonic.to_string(), descriptor);
        // Two kinds with one mnemonic is a programming error in a dialect.
        assert!(previous.is_none(), "`{mnemonic}` is registered twice");
    }
    pub fn get_kind(&self, mnemonic: &str) -> Option<&KindDescriptor> {
        self.kinds.get(mnemonic)
    }
    /// Registered mnemonics in alphabetical order.
    pub fn mnemonics(&self) -> Vec<&str> {
        let mut mnemonics: Vec<&str> = self.kinds.keys().map(|k| k.as_str()).collect();
        mnemonics.sort();
        mnemonics
    }
}

static REGISTRY: OnceLock<OpRegistry> = OnceLock::new();

/// The process-wide registry with the `func` and `toy` dialects.
///
/// Built on first use and read-only afterwards.
pub fn registry() -> &'static OpRegistry {
    REGISTRY.get_or_init(|| OpRegistry::with_dialects(&[&FuncDialect, &ToyDialect]))
}

/// Look up an op kind by mnemonic in the process-wide registry.
pub fn get_kind(mnemonic: &str) -> Option<&'static KindDescriptor> {
    registry().get_kind(mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_kinds() {
        let expected = vec![
            "func",
            "toy.add",
            "toy.constant",
            "toy.func",
            "toy.generic_call",
            "toy.mul",
            "toy.print",
            "toy.reshape",
            "toy.return",
            "toy.transpose",
        ];
        assert_eq!(registry().mnemonics(), expected);
        let kind = get_kind("toy.func").unwrap();
        assert_eq!(kind.name().as_str(), "func");
        assert!(get_kind("toy.sub").is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_mnemonic() {
        let mut registry = OpRegistry::new();
        registry.register::<crate::dialect::toy::AddOp>();
        registry.register::<crate::dialect::toy::AddOp>();
    }
}
