use crate::mlir_gen::mlir_gen;
use crate::parser::Parser;
use anyhow::Context;
use anyhow::Result;
use clap::ValueEnum;
use tracing::info;

/// What the compiler prints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The syntax tree of a toy file
    Ast,
    /// The IR
    Mlir,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Toy,
    Mlir,
}

impl InputKind {
    /// Decide by extension. Stdin (`-`) is toy source.
    pub fn from_path(path: &str) -> InputKind {
        if path.ends_with(".mlir") {
            InputKind::Mlir
        } else {
            InputKind::Toy
        }
    }
}

/// Compile `src`, which was read from `file`, and return the text to print.
pub fn compile(src: &str, file: &str, kind: InputKind, emit: Emit) -> Result<String> {
    info!("Compiling {file} as {kind:?} to {emit:?}");
    match (kind, emit) {
        (InputKind::Mlir, Emit::Ast) => {
            anyhow::bail!("cannot emit the AST of an MLIR input ({file})")
        }
        (InputKind::Mlir, Emit::Mlir) => {
            let module = toyir::parser::Parser::parse_file(src, file)
                .with_context(|| format!("failed to parse {file}"))?;
            Ok(module.to_string())
        }
        (InputKind::Toy, Emit::Ast) => {
            let module = Parser::parse(src, file)?;
            Ok(module.dump())
        }
        (InputKind::Toy, Emit::Mlir) => {
            let module = Parser::parse(src, file)?;
            let module = mlir_gen(&module)?;
            Ok(module.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_kind() {
        assert_eq!(InputKind::from_path("a/b.mlir"), InputKind::Mlir);
        assert_eq!(InputKind::from_path("b.toy"), InputKind::Toy);
        assert_eq!(InputKind::from_path("-"), InputKind::Toy);
    }

    #[test]
    fn ast_of_mlir_is_rejected() {
        let err = compile("module {\n}", "in.mlir", InputKind::Mlir, Emit::Ast).unwrap_err();
        assert!(err.to_string().contains("cannot emit the AST"));
    }
}
