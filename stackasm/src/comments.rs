//! Deferred comment annotations.
//!
//! During emission comments are only *recorded* against the instruction
//! count at the moment of recording; nothing touches the stream. The whole
//! buffer is applied in one pass when the compilation finishes. Positions
//! stay valid because instructions are append-only after the recording
//! point, so they are never renumbered.

use std::collections::BTreeMap;

/// Accumulates (stream-position, text) pairs during emission.
#[derive(Debug, Default)]
pub struct CommentBuffer {
    entries: Vec<(usize, String)>,
}

impl CommentBuffer {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `text` against stream position `pos`.
    pub fn record(&mut self, pos: usize, text: String) {
        self.entries.push((pos, text));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the buffer: group entries by position, keeping recorded order
    /// within each position.
    pub fn finish(self) -> Comments {
        let mut by_pos: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (pos, text) in self.entries {
            by_pos.entry(pos).or_default().push(text);
        }
        Comments { by_pos }
    }
}

/// The applied comment table carried by a finished compilation.
#[derive(Debug, Default)]
pub struct Comments {
    by_pos: BTreeMap<usize, Vec<String>>,
}

impl Comments {
    /// Comments anchored at stream position `pos`, in recorded order.
    pub fn at(&self, pos: usize) -> &[String] {
        self.by_pos.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_pos.is_empty()
    }

    /// All (position, text) pairs in stream order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.by_pos
            .iter()
            .flat_map(|(&pos, texts)| texts.iter().map(move |t| (pos, t.as_str())))
    }
}
