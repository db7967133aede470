//! Pin block merger
//!
//! Splices generated per-layer blocks into a parsed program in a single pass.
//! Original lines are never altered or reordered; the merger only inserts.

use std::collections::{BTreeMap, BTreeSet};

use crate::document::Document;
use crate::error::{MergeError, MergeResult};
use crate::gcode::GcodeLine;
use crate::markers::{HEADER_MARKERS, HEADER_TITLE, LAYER_CHANGE, OBJECT_MARKER, PROGRAM_END};

/// Generated lines grouped by the completed layer they follow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerBlocks {
    /// Block of lines per completed layer
    pub blocks: BTreeMap<u32, Vec<GcodeLine>>,
    /// Layers that must receive a block
    pub expected: BTreeSet<u32>,
}

impl LayerBlocks {
    /// Create an empty set of blocks
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the block for `layer` and mark the layer as expected
    pub fn insert(&mut self, layer: u32, lines: Vec<GcodeLine>) {
        self.expected.insert(layer);
        self.blocks.insert(layer, lines);
    }

    /// Mark a layer as expected without providing a block
    pub fn expect(&mut self, layer: u32) {
        self.expected.insert(layer);
    }

    /// Block generated for `layer`
    pub fn get(&self, layer: u32) -> Option<&Vec<GcodeLine>> {
        self.blocks.get(&layer)
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether there are no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of generated lines
    pub fn total_lines(&self) -> usize {
        self.blocks.values().map(Vec::len).sum()
    }
}

/// Merge options
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Lowest layer whose layer-change marker may trigger a block
    ///
    /// The marker opening layer L flushes the block of completed layer L-1.
    pub start_layer: u32,
    /// Constants block as `(key, value)` pairs; `None` skips the header
    pub header: Option<Vec<(String, String)>>,
}

fn header_lines(pairs: &[(String, String)]) -> Vec<GcodeLine> {
    let mut lines = Vec::with_capacity(pairs.len() + 3);
    lines.push(GcodeLine::blank());
    lines.push(GcodeLine::comment_only(HEADER_TITLE));
    lines.extend(
        pairs
            .iter()
            .map(|(k, v)| GcodeLine::comment_only(format!("{}: {}", k, v))),
    );
    lines.push(GcodeLine::blank());
    lines
}

fn is_header_marker(line: &GcodeLine) -> bool {
    HEADER_MARKERS.iter().any(|m| line.is_marker(m))
}

struct MergeState<'a> {
    blocks: &'a LayerBlocks,
    start_layer: u32,
    flushed: BTreeSet<u32>,
    out: Vec<GcodeLine>,
}

impl MergeState<'_> {
    /// Whether the block of completed `layer` passes the start-layer gate
    fn gated(&self, layer: u32) -> bool {
        layer + 1 >= self.start_layer
    }

    /// Insert the block of `layer` unless already inserted
    fn flush(&mut self, layer: u32) -> bool {
        if !self.gated(layer) || self.flushed.contains(&layer) {
            return false;
        }
        let Some(block) = self.blocks.get(layer) else {
            return false;
        };
        self.out.push(GcodeLine::blank().on_layer(layer));
        self.out.extend(block.iter().cloned());
        self.out.push(GcodeLine::blank().on_layer(layer));
        self.flushed.insert(layer);
        tracing::debug!("Inserted {} pin lines after layer {}", block.len(), layer);
        true
    }
}

/// Splice `blocks` into `document`
pub fn merge(
    document: &Document,
    blocks: &LayerBlocks,
    options: &MergeOptions,
) -> MergeResult<Document> {
    let mut header = options.header.as_deref();
    if header.is_some() && document.contains_marker(HEADER_TITLE) {
        tracing::debug!("Pinning header already present, skipping");
        header = None;
    }
    if header.is_some() && !document.iter().any(is_header_marker) {
        return Err(MergeError::DocumentMarkerMissing {
            expected: HEADER_MARKERS.join(", "),
        });
    }

    let mut state = MergeState {
        blocks,
        start_layer: options.start_layer,
        flushed: BTreeSet::new(),
        out: Vec::with_capacity(document.len() + blocks.total_lines() + 64),
    };

    let mut last_layer = 0;
    for line in document.iter() {
        last_layer = line.layer;
        if line.is_marker(OBJECT_MARKER) {
            tracing::debug!("Object marker: {}", line.comment);
        }

        if let Some(pairs) = header {
            if is_header_marker(line) {
                state.out.extend(header_lines(pairs));
                header = None;
            }
        }

        if line.is_comment_only() && line.comment == LAYER_CHANGE {
            let completed = line.layer;
            if state.gated(completed)
                && !state.flush(completed)
                && blocks.expected.contains(&completed)
                && !state.flushed.contains(&completed)
            {
                return Err(MergeError::MissingScheduleEntry { layer: completed });
            }
        } else if line.is_marker(PROGRAM_END) {
            state.flush(line.layer);
        }

        state.out.push(line.clone());
    }

    let pending: Vec<u32> = blocks
        .expected
        .iter()
        .chain(blocks.blocks.keys())
        .copied()
        .filter(|&l| state.gated(l) && !state.flushed.contains(&l))
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();
    if let Some(&layer) = pending.first() {
        tracing::warn!(
            "{} pin blocks were never inserted: {:?}",
            pending.len(),
            pending
        );
        return Err(MergeError::LayerNotReached { layer, last_layer });
    }

    tracing::info!(
        "Merged {} pin blocks into {} lines",
        state.flushed.len(),
        document.len()
    );
    Ok(Document::new(state.out, document.trailing_newline))
}

/// Render a document back to program text
pub fn serialize(document: &Document) -> String {
    document.to_text()
}
