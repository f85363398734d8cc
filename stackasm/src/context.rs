//! The compilation context for one method body.
//!
//! A [`MethodContext`] is created per method, mutated by the translator
//! during a single top-to-bottom AST walk, and consumed exactly once by
//! [`MethodContext::finish`]. It owns the instruction stream and keeps the
//! cross-cutting bookkeeping consistent while instructions are emitted out
//! of source order:
//!
//! - the label table (name → placeholder, placeholder → declaring AST),
//! - the line/instruction cross-index (last-writer-wins in reverse),
//! - the deferred comment buffer,
//! - the write-once variable-name cache.
//!
//! The context performs no validation of source programs; undefined label
//! references and similar conditions are surfaced by the translator, which
//! has the referencing line at hand.

use std::collections::HashMap;

use log::trace;
use rustc_hash::FxHashMap;

use crate::ast::LabelAst;
use crate::comments::{CommentBuffer, Comments};
use crate::error::AsmError;
use crate::insn::{Insn, InsnArena, InsnId};
use crate::vars::VariableNameCache;

pub struct MethodContext {
    arena: InsnArena,
    stream: Vec<InsnId>,
    labels: HashMap<String, InsnId>,
    label_asts: FxHashMap<InsnId, LabelAst>,
    lines: FxHashMap<InsnId, u32>,
    line_index: FxHashMap<u32, InsnId>,
    comments: CommentBuffer,
    var_names: Option<VariableNameCache>,
}

impl MethodContext {
    pub fn new() -> Self {
        Self {
            arena: InsnArena::new(),
            stream: Vec::new(),
            labels: HashMap::new(),
            label_asts: FxHashMap::default(),
            lines: FxHashMap::default(),
            line_index: FxHashMap::default(),
            comments: CommentBuffer::new(),
            var_names: None,
        }
    }

    pub fn arena(&self) -> &InsnArena {
        &self.arena
    }

    /// Emitted instructions, in stream order.
    pub fn stream(&self) -> &[InsnId] {
        &self.stream
    }

    /// Allocate an instruction without appending it to the stream.
    pub fn alloc(&mut self, insn: Insn) -> InsnId {
        self.arena.alloc(insn)
    }

    /// Allocate a label placeholder. Create one per label name and reuse it
    /// for every forward or backward reference to that name.
    pub fn placeholder(&mut self) -> InsnId {
        self.arena.alloc(Insn::Label)
    }

    /// Append a freshly constructed instruction and assign its source line.
    pub fn emit(&mut self, insn: Insn, line: u32) -> InsnId {
        let id = self.arena.alloc(insn);
        self.append(id, line);
        id
    }

    /// Append an already-allocated instruction (a label placeholder at its
    /// declaration site) and assign its source line. The instruction must
    /// not already be in the stream; appending twice is a translator bug.
    pub fn append(&mut self, id: InsnId, line: u32) {
        debug_assert!(
            !self.stream.contains(&id),
            "instruction {id} appended twice"
        );
        trace!("append {} <- {}", id, self.arena.get(id));
        self.stream.push(id);
        self.assign(id, line);
    }

    /// Record `id` → `line` and overwrite `line` → `id`. Later assignments
    /// on the same line shadow earlier ones in the reverse index.
    pub fn assign(&mut self, id: InsnId, line: u32) {
        self.lines.insert(id, line);
        self.line_index.insert(line, id);
    }

    /// Register a label declaration. Must be called exactly once per
    /// distinct label name; a second registration is a hard error carrying
    /// both declaration lines.
    pub fn register_label(
        &mut self,
        ast: LabelAst,
        placeholder: InsnId,
    ) -> Result<(), AsmError> {
        if let Some(first) = self.labels.get(&ast.name) {
            let first_line =
                self.label_asts.get(first).map(|a| a.line).unwrap_or(0);
            return Err(AsmError::DuplicateLabel {
                name: ast.name,
                line: ast.line,
                first_line,
            });
        }
        self.labels.insert(ast.name.clone(), placeholder);
        self.label_asts.insert(placeholder, ast);
        Ok(())
    }

    /// Look up a label placeholder by name. Registration order is
    /// irrelevant; forward references resolve once the declaration pass has
    /// run.
    pub fn label(&self, name: &str) -> Option<InsnId> {
        self.labels.get(name).copied()
    }

    /// The AST node that declared `placeholder`, for diagnostics.
    pub fn label_ast(&self, placeholder: InsnId) -> Option<&LabelAst> {
        self.label_asts.get(&placeholder)
    }

    /// The source line assigned to `id`, or `None` for instructions without
    /// source provenance.
    pub fn line_of(&self, id: InsnId) -> Option<u32> {
        self.lines.get(&id).copied()
    }

    /// Best-effort reverse lookup: the most recently assigned instruction
    /// on `line`.
    pub fn insn_at_line(&self, line: u32) -> Option<InsnId> {
        self.line_index.get(&line).copied()
    }

    /// Record a comment anchored at the current instruction count. The
    /// stream itself is untouched until [`finish`](Self::finish).
    pub fn add_comment(&mut self, text: impl Into<String>) {
        self.comments.record(self.stream.len(), text.into());
    }

    /// Install the variable-name cache. Callable once; the naming pass is
    /// the single owner of this assignment.
    pub fn set_variable_names(&mut self, names: VariableNameCache) {
        assert!(
            self.var_names.is_none(),
            "variable names installed twice"
        );
        self.var_names = Some(names);
    }

    pub fn variable_names(&self) -> Option<&VariableNameCache> {
        self.var_names.as_ref()
    }

    /// Complete the compilation: apply the comment buffer to the stream and
    /// freeze everything. Consuming `self` makes double-finalize and
    /// post-finalize mutation unrepresentable; the returned
    /// [`CompiledMethod`] stays queryable for diagnostics.
    pub fn finish(self) -> CompiledMethod {
        CompiledMethod {
            arena: self.arena,
            stream: self.stream,
            labels: self.labels,
            label_asts: self.label_asts,
            lines: self.lines,
            line_index: self.line_index,
            comments: self.comments.finish(),
            var_names: self.var_names,
        }
    }
}

impl Default for MethodContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished method body: the instruction stream with comments applied,
/// plus the read-only bookkeeping for diagnostics and source mapping.
#[derive(Debug)]
pub struct CompiledMethod {
    arena: InsnArena,
    stream: Vec<InsnId>,
    labels: HashMap<String, InsnId>,
    label_asts: FxHashMap<InsnId, LabelAst>,
    lines: FxHashMap<InsnId, u32>,
    line_index: FxHashMap<u32, InsnId>,
    comments: Comments,
    var_names: Option<VariableNameCache>,
}

impl CompiledMethod {
    pub fn arena(&self) -> &InsnArena {
        &self.arena
    }

    pub fn stream(&self) -> &[InsnId] {
        &self.stream
    }

    pub fn label(&self, name: &str) -> Option<InsnId> {
        self.labels.get(name).copied()
    }

    pub fn label_ast(&self, placeholder: InsnId) -> Option<&LabelAst> {
        self.label_asts.get(&placeholder)
    }

    pub fn line_of(&self, id: InsnId) -> Option<u32> {
        self.lines.get(&id).copied()
    }

    pub fn insn_at_line(&self, line: u32) -> Option<InsnId> {
        self.line_index.get(&line).copied()
    }

    /// The applied comment table, keyed by stream position.
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    pub fn variable_names(&self) -> Option<&VariableNameCache> {
        self.var_names.as_ref()
    }

    /// Render the stream as source-like text: comments interleaved at
    /// their recorded positions, labels by name, jump operands by the name
    /// of their target label, loads and stores annotated with variable
    /// display names where the cache has one.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (pos, &id) in self.stream.iter().enumerate() {
            for text in self.comments.at(pos) {
                out.push_str("// ");
                out.push_str(text);
                out.push('\n');
            }
            out.push_str(&self.render_insn(id));
            out.push('\n');
        }
        for text in self.comments.at(self.stream.len()) {
            out.push_str("// ");
            out.push_str(text);
            out.push('\n');
        }
        out
    }

    fn render_insn(&self, id: InsnId) -> String {
        let target_name = |target: &InsnId| {
            self.label_asts
                .get(target)
                .map(|ast| ast.name.clone())
                .unwrap_or_else(|| target.to_string())
        };
        let slot_suffix = |slot: u16| {
            self.var_names
                .as_ref()
                .and_then(|cache| cache.name_of(slot))
                .map(|name| format!(" // {name}"))
                .unwrap_or_default()
        };
        match self.arena.get(id) {
            Insn::Label => format!("{}:", target_name(&id)),
            Insn::Push { value } => format!("    push {value}"),
            Insn::Load { slot } => {
                format!("    load {}{}", slot, slot_suffix(*slot))
            }
            Insn::Store { slot } => {
                format!("    store {}{}", slot, slot_suffix(*slot))
            }
            Insn::Add => "    add".into(),
            Insn::Sub => "    sub".into(),
            Insn::Mul => "    mul".into(),
            Insn::Div => "    div".into(),
            Insn::Jump { target } => {
                format!("    jump {}", target_name(target))
            }
            Insn::JumpZ { target } => {
                format!("    jumpz {}", target_name(target))
            }
            Insn::JumpNz { target } => {
                format!("    jumpnz {}", target_name(target))
            }
            Insn::Call { name } => format!("    call {name}"),
            Insn::Ret => "    ret".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_ast(name: &str, line: u32) -> LabelAst {
        LabelAst {
            name: name.into(),
            line,
        }
    }

    #[test]
    fn emit_assigns_supplied_line() {
        let mut ctx = MethodContext::new();
        let a = ctx.emit(Insn::Push { value: 1 }, 10);
        let b = ctx.emit(Insn::Push { value: 2 }, 20);
        let c = ctx.emit(Insn::Ret, 30);
        assert_eq!(ctx.line_of(a), Some(10));
        assert_eq!(ctx.line_of(b), Some(20));
        assert_eq!(ctx.line_of(c), Some(30));
        assert_eq!(ctx.stream(), &[a, b, c]);
    }

    #[test]
    fn unassigned_instruction_has_no_line() {
        let mut ctx = MethodContext::new();
        let synthetic = ctx.alloc(Insn::Ret);
        assert_eq!(ctx.line_of(synthetic), None);
    }

    #[test]
    fn later_assignment_shadows_reverse_lookup() {
        let mut ctx = MethodContext::new();
        let first = ctx.emit(Insn::Push { value: 1 }, 10);
        let _mid = ctx.emit(Insn::Push { value: 2 }, 11);
        let third = ctx.emit(Insn::Ret, 10);
        assert_eq!(ctx.insn_at_line(10), Some(third));
        assert_ne!(ctx.insn_at_line(10), Some(first));
        // Forward direction is untouched by the shadowing.
        assert_eq!(ctx.line_of(first), Some(10));
        assert_eq!(ctx.line_of(third), Some(10));
    }

    #[test]
    fn assign_without_append() {
        let mut ctx = MethodContext::new();
        let id = ctx.alloc(Insn::Ret);
        ctx.assign(id, 42);
        assert_eq!(ctx.line_of(id), Some(42));
        assert_eq!(ctx.insn_at_line(42), Some(id));
        assert!(ctx.stream().is_empty());
    }

    #[test]
    fn register_and_resolve_label() {
        let mut ctx = MethodContext::new();
        let p = ctx.placeholder();
        ctx.register_label(label_ast("L1", 3), p).unwrap();
        assert_eq!(ctx.label("L1"), Some(p));
        assert_eq!(ctx.label("missing"), None);
        assert_eq!(ctx.label_ast(p), Some(&label_ast("L1", 3)));
    }

    #[test]
    fn forward_reference_resolves_regardless_of_emission_order() {
        let mut ctx = MethodContext::new();
        let p = ctx.placeholder();
        ctx.register_label(label_ast("loop", 7), p).unwrap();
        // Reference the label before its declaration site is appended.
        let jump = ctx.emit(Insn::Jump { target: p }, 2);
        assert_eq!(ctx.label("loop"), Some(p));
        ctx.append(p, 7);
        assert_eq!(ctx.label("loop"), Some(p));
        assert_eq!(ctx.stream(), &[jump, p]);
        assert_eq!(ctx.line_of(p), Some(7));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut ctx = MethodContext::new();
        let p = ctx.placeholder();
        let q = ctx.placeholder();
        ctx.register_label(label_ast("L", 1), p).unwrap();
        let err = ctx.register_label(label_ast("L", 5), q).unwrap_err();
        assert_eq!(
            err,
            AsmError::DuplicateLabel {
                name: "L".into(),
                line: 5,
                first_line: 1,
            }
        );
        // The first registration stays in force.
        assert_eq!(ctx.label("L"), Some(p));
    }

    #[test]
    fn comment_keeps_its_recorded_position() {
        let mut ctx = MethodContext::new();
        ctx.emit(Insn::Push { value: 1 }, 1);
        ctx.emit(Insn::Push { value: 2 }, 2);
        ctx.add_comment("anchored at two");
        ctx.emit(Insn::Add, 3);
        ctx.emit(Insn::Ret, 4);
        let method = ctx.finish();
        assert_eq!(method.comments().at(2), &["anchored at two"]);
        assert_eq!(method.comments().at(4), &[] as &[String]);
    }

    #[test]
    fn comment_at_empty_stream_and_at_end() {
        let mut ctx = MethodContext::new();
        ctx.add_comment("prologue");
        ctx.emit(Insn::Ret, 1);
        ctx.add_comment("epilogue");
        let method = ctx.finish();
        assert_eq!(method.comments().at(0), &["prologue"]);
        assert_eq!(method.comments().at(1), &["epilogue"]);
    }

    #[test]
    fn finish_without_comments_is_a_noop_on_the_stream() {
        let mut ctx = MethodContext::new();
        let id = ctx.emit(Insn::Ret, 1);
        let method = ctx.finish();
        assert!(method.comments().is_empty());
        assert_eq!(method.stream(), &[id]);
    }

    #[test]
    fn finished_method_stays_queryable() {
        let mut ctx = MethodContext::new();
        let p = ctx.placeholder();
        ctx.register_label(label_ast("end", 9), p).unwrap();
        let push = ctx.emit(Insn::Push { value: 5 }, 4);
        ctx.append(p, 9);
        let method = ctx.finish();
        assert_eq!(method.line_of(push), Some(4));
        assert_eq!(method.insn_at_line(9), Some(p));
        assert_eq!(method.label("end"), Some(p));
        assert_eq!(method.label_ast(p), Some(&label_ast("end", 9)));
    }

    #[test]
    fn variable_names_absent_until_set() {
        let mut ctx = MethodContext::new();
        assert!(ctx.variable_names().is_none());
        let mut cache = VariableNameCache::new();
        cache.insert(0, "counter".into());
        ctx.set_variable_names(cache.clone());
        assert_eq!(ctx.variable_names(), Some(&cache));
        let method = ctx.finish();
        assert_eq!(method.variable_names(), Some(&cache));
    }

    #[test]
    #[should_panic(expected = "variable names installed twice")]
    fn variable_names_are_write_once() {
        let mut ctx = MethodContext::new();
        ctx.set_variable_names(VariableNameCache::new());
        ctx.set_variable_names(VariableNameCache::new());
    }
}
