//! AST-walking translator: drives a [`MethodContext`] over one method body.
//!
//! Three passes over the node list:
//!
//! 1. Label collection — one placeholder per declared name, registered up
//!    front so forward references resolve during emission.
//! 2. Naming — `var` directives become the variable-name cache, installed
//!    on the context exactly once.
//! 3. Emission — comments are recorded, label declarations append their
//!    placeholder, instructions are emitted in source order, and jump
//!    operands resolve through the label table. An unresolved name is a
//!    compile error carrying the referencing line.

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::ast::{Ast, InsnKind};
use crate::context::{CompiledMethod, MethodContext};
use crate::error::AsmError;
use crate::insn::{Insn, InsnId};
use crate::vars::VariableNameCache;

/// Translate parsed nodes into a finished method body.
pub fn translate(nodes: &[Ast]) -> Result<CompiledMethod, AsmError> {
    let mut ctx = MethodContext::new();

    collect_labels(&mut ctx, nodes)?;
    ctx.set_variable_names(collect_var_names(nodes)?);
    emit(&mut ctx, nodes)?;

    debug!(
        "translated {} nodes into {} instructions",
        nodes.len(),
        ctx.stream().len()
    );
    Ok(ctx.finish())
}

fn collect_labels(
    ctx: &mut MethodContext,
    nodes: &[Ast],
) -> Result<(), AsmError> {
    let mut count = 0usize;
    for node in nodes {
        if let Ast::Label(ast) = node {
            let placeholder = ctx.placeholder();
            ctx.register_label(ast.clone(), placeholder)?;
            count += 1;
        }
    }
    debug!("collected {count} labels");
    Ok(())
}

fn collect_var_names(nodes: &[Ast]) -> Result<VariableNameCache, AsmError> {
    let mut cache = VariableNameCache::new();
    let mut first_lines: FxHashMap<u16, u32> = FxHashMap::default();
    for node in nodes {
        if let Ast::Var(ast) = node {
            if let Some(&first_line) = first_lines.get(&ast.slot) {
                return Err(AsmError::DuplicateVar {
                    slot: ast.slot,
                    line: ast.line,
                    first_line,
                });
            }
            first_lines.insert(ast.slot, ast.line);
            cache.insert(ast.slot, ast.name.clone());
        }
    }
    debug!("named {} variable slots", cache.len());
    Ok(cache)
}

fn emit(ctx: &mut MethodContext, nodes: &[Ast]) -> Result<(), AsmError> {
    for node in nodes {
        match node {
            Ast::Comment(ast) => {
                trace!("comment at position {}", ctx.stream().len());
                ctx.add_comment(&ast.text);
            }
            Ast::Var(_) => {} // consumed by the naming pass
            Ast::Label(ast) => {
                let placeholder = ctx
                    .label(&ast.name)
                    .expect("label registered in collection pass");
                ctx.append(placeholder, ast.line);
            }
            Ast::Insn(ast) => {
                let insn = lower(ctx, &ast.kind, ast.line)?;
                ctx.emit(insn, ast.line);
            }
        }
    }
    Ok(())
}

fn lower(
    ctx: &MethodContext,
    kind: &InsnKind,
    line: u32,
) -> Result<Insn, AsmError> {
    let insn = match kind {
        InsnKind::Push(value) => Insn::Push { value: *value },
        InsnKind::Load(slot) => Insn::Load { slot: *slot },
        InsnKind::Store(slot) => Insn::Store { slot: *slot },
        InsnKind::Add => Insn::Add,
        InsnKind::Sub => Insn::Sub,
        InsnKind::Mul => Insn::Mul,
        InsnKind::Div => Insn::Div,
        InsnKind::Jump(name) => Insn::Jump {
            target: resolve(ctx, name, line)?,
        },
        InsnKind::JumpZ(name) => Insn::JumpZ {
            target: resolve(ctx, name, line)?,
        },
        InsnKind::JumpNz(name) => Insn::JumpNz {
            target: resolve(ctx, name, line)?,
        },
        InsnKind::Call(name) => Insn::Call { name: name.clone() },
        InsnKind::Ret => Insn::Ret,
    };
    Ok(insn)
}

fn resolve(
    ctx: &MethodContext,
    name: &str,
    line: u32,
) -> Result<InsnId, AsmError> {
    ctx.label(name).ok_or_else(|| AsmError::UndefinedLabel {
        name: name.to_string(),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn assemble(source: &str) -> Result<CompiledMethod, AsmError> {
        translate(&parse(source)?)
    }

    #[test]
    fn forward_jump_resolves() {
        let method = assemble("    jump end\n    push 1\nend:\n    ret\n")
            .unwrap();
        let jump = method.stream()[0];
        let end = method.label("end").unwrap();
        assert_eq!(method.arena().get(jump), &Insn::Jump { target: end });
        // The placeholder sits in the stream at its declaration site.
        assert_eq!(method.stream()[2], end);
        assert_eq!(method.line_of(end), Some(3));
    }

    #[test]
    fn undefined_label_names_the_referencing_line() {
        let err = assemble("    push 1\n    jumpz nowhere\n").unwrap_err();
        assert_eq!(err, AsmError::UndefinedLabel {
            name: "nowhere".into(),
            line: 2,
        });
    }

    #[test]
    fn duplicate_label_names_both_lines() {
        let err = assemble("a:\n    ret\na:\n").unwrap_err();
        assert_eq!(err, AsmError::DuplicateLabel {
            name: "a".into(),
            line: 3,
            first_line: 1,
        });
    }

    #[test]
    fn duplicate_var_slot_is_rejected() {
        let err = assemble("var 0 x\nvar 0 y\n    ret\n").unwrap_err();
        assert_eq!(err, AsmError::DuplicateVar {
            slot: 0,
            line: 2,
            first_line: 1,
        });
    }

    #[test]
    fn var_directives_feed_the_name_cache() {
        let method = assemble("var 0 counter\nvar 1 limit\n    ret\n").unwrap();
        let names = method.variable_names().unwrap();
        assert_eq!(names.name_of(0), Some("counter"));
        assert_eq!(names.name_of(1), Some("limit"));
        assert_eq!(names.name_of(2), None);
    }

    #[test]
    fn comments_anchor_to_the_instruction_count() {
        let method = assemble(
            "// before anything\n    push 1\n// between\n    ret\n// after\n",
        )
        .unwrap();
        assert_eq!(method.comments().at(0), &["before anything"]);
        assert_eq!(method.comments().at(1), &["between"]);
        assert_eq!(method.comments().at(2), &["after"]);
    }

    #[test]
    fn lines_cross_index_both_ways() {
        let method = assemble("    push 1\n    push 2\n    add\n").unwrap();
        let stream = method.stream();
        assert_eq!(method.line_of(stream[0]), Some(1));
        assert_eq!(method.line_of(stream[2]), Some(3));
        assert_eq!(method.insn_at_line(2), Some(stream[1]));
        assert_eq!(method.insn_at_line(99), None);
    }
}
