//! Stack-VM instruction representation.
//!
//! Instructions are identified by a stable [`InsnId`] handed out by the
//! [`InsnArena`] at allocation time. Allocation and stream placement are
//! separate steps: a label placeholder is allocated once per name and can
//! be the target of forward jumps long before it is appended to the
//! instruction stream at its declaration site.

use std::fmt;

/// Stable identity of an instruction for the lifetime of one compilation.
///
/// All cross-index maps key on this id rather than on reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InsnId(u32);

impl InsnId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One instruction of the target stack machine.
///
/// Jump targets are the [`InsnId`] of a label placeholder, never a raw
/// stream position, so emission order does not constrain reference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    /// Push an integer constant onto the operand stack.
    Push { value: i64 },
    /// Load local variable `slot` onto the operand stack.
    Load { slot: u16 },
    /// Pop the operand stack into local variable `slot`.
    Store { slot: u16 },
    Add,
    Sub,
    Mul,
    Div,
    /// Unconditional jump to a label placeholder.
    Jump { target: InsnId },
    /// Pop and jump if the value is zero.
    JumpZ { target: InsnId },
    /// Pop and jump if the value is non-zero.
    JumpNz { target: InsnId },
    /// Invoke a named routine.
    Call { name: String },
    Ret,
    /// Marker standing in for a jump target. Exactly one per label name.
    Label,
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Push { value } => write!(f, "Push {value}"),
            Insn::Load { slot } => write!(f, "Load r{slot}"),
            Insn::Store { slot } => write!(f, "Store r{slot}"),
            Insn::Add => write!(f, "Add"),
            Insn::Sub => write!(f, "Sub"),
            Insn::Mul => write!(f, "Mul"),
            Insn::Div => write!(f, "Div"),
            Insn::Jump { target } => write!(f, "Jump {target}"),
            Insn::JumpZ { target } => write!(f, "JumpZ {target}"),
            Insn::JumpNz { target } => write!(f, "JumpNz {target}"),
            Insn::Call { name } => write!(f, "Call {name}"),
            Insn::Ret => write!(f, "Ret"),
            Insn::Label => write!(f, "Label"),
        }
    }
}

/// Owns instruction payloads and hands out ids.
#[derive(Debug, Default)]
pub struct InsnArena {
    insns: Vec<Insn>,
}

impl InsnArena {
    pub fn new() -> Self {
        Self { insns: Vec::new() }
    }

    /// Allocate an id for `insn`. The id is valid for the whole
    /// compilation whether or not the instruction ever reaches the stream.
    pub fn alloc(&mut self, insn: Insn) -> InsnId {
        let id = InsnId(self.insns.len() as u32);
        self.insns.push(insn);
        id
    }

    pub fn get(&self, id: InsnId) -> &Insn {
        &self.insns[id.index()]
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}
