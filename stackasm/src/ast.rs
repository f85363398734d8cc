//! Source-level nodes for the textual method-body syntax.
//!
//! The parser produces one [`Ast`] node per meaningful source line, in
//! source order. Every node carries its 1-based source line so downstream
//! consumers (the cross-index, error reporting) always know where it came
//! from.
//!
//! Comments are preserved as first-class nodes rather than stripped: the
//! translator turns them into recorded stream annotations.

/// A label declaration: `name:` on its own line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAst {
    pub name: String,
    pub line: u32,
}

/// One instruction line, still referring to labels by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsnAst {
    pub kind: InsnKind,
    pub line: u32,
}

/// The source-level instruction forms. Jump operands are unresolved label
/// names; resolution happens during translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsnKind {
    Push(i64),
    Load(u16),
    Store(u16),
    Add,
    Sub,
    Mul,
    Div,
    Jump(String),
    JumpZ(String),
    JumpNz(String),
    Call(String),
    Ret,
}

/// A `var <slot> <name>` directive for the variable-naming pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarAst {
    pub slot: u16,
    pub name: String,
    pub line: u32,
}

/// A free-standing `// ...` comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAst {
    pub text: String,
    pub line: u32,
}

/// A parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Label(LabelAst),
    Insn(InsnAst),
    Var(VarAst),
    Comment(CommentAst),
}

impl Ast {
    /// The 1-based source line this node came from.
    pub fn line(&self) -> u32 {
        match self {
            Ast::Label(ast) => ast.line,
            Ast::Insn(ast) => ast.line,
            Ast::Var(ast) => ast.line,
            Ast::Comment(ast) => ast.line,
        }
    }
}
