//! Line-oriented parser for the textual method-body syntax.
//!
//! One [`Ast`] node per meaningful line:
//!
//! ```text
//! // a free-standing comment
//! var 0 counter
//! start:
//!     push 10
//!     store 0
//! loop:
//!     load 0
//!     push 1
//!     sub
//!     store 0
//!     load 0
//!     jumpnz loop
//!     ret
//! ```
//!
//! Blank lines are skipped. Inline comments are not supported; a comment
//! owns its whole line.

use crate::ast::{Ast, CommentAst, InsnAst, InsnKind, LabelAst, VarAst};
use crate::error::AsmError;

/// Parse a whole method body into AST nodes, in source order.
pub fn parse(source: &str) -> Result<Vec<Ast>, AsmError> {
    let mut nodes = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx as u32 + 1;
        if let Some(node) = parse_line(raw, line)? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

fn parse_line(raw: &str, line: u32) -> Result<Option<Ast>, AsmError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if let Some(comment) = text.strip_prefix("//") {
        return Ok(Some(Ast::Comment(CommentAst {
            text: comment.trim().to_string(),
            line,
        })));
    }
    if let Some(name) = text.strip_suffix(':') {
        let name = name.trim();
        check_ident(name, line)?;
        return Ok(Some(Ast::Label(LabelAst {
            name: name.to_string(),
            line,
        })));
    }

    let mut words = text.split_whitespace();
    let mnemonic = words.next().expect("non-empty line has a first word");
    let operands: Vec<&str> = words.collect();

    if mnemonic == "var" {
        let [slot, name] = expect_operands::<2>(mnemonic, &operands, line)?;
        let slot = parse_slot(slot, line)?;
        check_ident(name, line)?;
        return Ok(Some(Ast::Var(VarAst {
            slot,
            name: name.to_string(),
            line,
        })));
    }

    let kind = match mnemonic {
        "push" => {
            let [value] = expect_operands::<1>(mnemonic, &operands, line)?;
            InsnKind::Push(parse_int(value, line)?)
        }
        "load" => {
            let [slot] = expect_operands::<1>(mnemonic, &operands, line)?;
            InsnKind::Load(parse_slot(slot, line)?)
        }
        "store" => {
            let [slot] = expect_operands::<1>(mnemonic, &operands, line)?;
            InsnKind::Store(parse_slot(slot, line)?)
        }
        "add" => {
            expect_operands::<0>(mnemonic, &operands, line)?;
            InsnKind::Add
        }
        "sub" => {
            expect_operands::<0>(mnemonic, &operands, line)?;
            InsnKind::Sub
        }
        "mul" => {
            expect_operands::<0>(mnemonic, &operands, line)?;
            InsnKind::Mul
        }
        "div" => {
            expect_operands::<0>(mnemonic, &operands, line)?;
            InsnKind::Div
        }
        "jump" => {
            let [name] = expect_operands::<1>(mnemonic, &operands, line)?;
            check_ident(name, line)?;
            InsnKind::Jump(name.to_string())
        }
        "jumpz" => {
            let [name] = expect_operands::<1>(mnemonic, &operands, line)?;
            check_ident(name, line)?;
            InsnKind::JumpZ(name.to_string())
        }
        "jumpnz" => {
            let [name] = expect_operands::<1>(mnemonic, &operands, line)?;
            check_ident(name, line)?;
            InsnKind::JumpNz(name.to_string())
        }
        "call" => {
            let [name] = expect_operands::<1>(mnemonic, &operands, line)?;
            check_ident(name, line)?;
            InsnKind::Call(name.to_string())
        }
        "ret" => {
            expect_operands::<0>(mnemonic, &operands, line)?;
            InsnKind::Ret
        }
        other => {
            return Err(AsmError::parse(
                line,
                format!("unknown mnemonic `{other}`"),
            ));
        }
    };
    Ok(Some(Ast::Insn(InsnAst { kind, line })))
}

fn expect_operands<'a, const N: usize>(
    mnemonic: &str,
    operands: &[&'a str],
    line: u32,
) -> Result<[&'a str; N], AsmError> {
    <[&str; N]>::try_from(operands).map_err(|_| {
        AsmError::parse(
            line,
            format!(
                "`{mnemonic}` takes {N} operand(s), got {}",
                operands.len()
            ),
        )
    })
}

fn parse_int(text: &str, line: u32) -> Result<i64, AsmError> {
    text.parse::<i64>()
        .map_err(|_| AsmError::parse(line, format!("bad integer `{text}`")))
}

fn parse_slot(text: &str, line: u32) -> Result<u16, AsmError> {
    text.parse::<u16>().map_err(|_| {
        AsmError::parse(line, format!("bad variable slot `{text}`"))
    })
}

fn check_ident(name: &str, line: u32) -> Result<(), AsmError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AsmError::parse(line, format!("bad identifier `{name}`")))
    }
}
