mod ast;
mod comments;
mod context;
mod error;
mod insn;
mod parse;
mod translate;
mod vars;

pub use ast::{Ast, CommentAst, InsnAst, InsnKind, LabelAst, VarAst};
pub use comments::{CommentBuffer, Comments};
pub use context::{CompiledMethod, MethodContext};
pub use error::AsmError;
pub use insn::{Insn, InsnArena, InsnId};
pub use parse::parse;
pub use translate::translate;
pub use vars::VariableNameCache;

/// Assemble one textual method body into a finished instruction stream.
pub fn assemble(source: &str) -> Result<CompiledMethod, AsmError> {
    translate(&parse(source)?)
}
