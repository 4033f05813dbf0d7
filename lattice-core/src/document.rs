//! Yrs-backed text document.
//!
//! One root text type (`"content"`) per replica. Local edits run inside a
//! single `TransactionMut` and return the v1-encoded delta of that
//! transaction; remote updates are decoded and applied without ever
//! materializing the document.

use serde::{Deserialize, Serialize};
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{
    Doc, GetString, OffsetKind, Options, ReadTxn, StateVector, Text, TextRef, Transact,
    TransactionMut, Update,
};

use crate::replica::{LogError, ReplicatedLog, UpdateOrigin};

const CONTENT: &str = "content";

/// Comparable view of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Full text content
    pub content: String,
    /// Paragraphs (content split on '\n')
    pub blocks: Vec<String>,
}

impl DocumentSnapshot {
    pub fn from_content(content: String) -> Self {
        let blocks = if content.is_empty() {
            Vec::new()
        } else {
            content.split('\n').map(str::to_string).collect()
        };
        Self { content, blocks }
    }

    /// Serialize to JSON (used in divergence reports).
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Render as one `<p>` per block, roughly what an editor would mount.
    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(|block| format!("<p>{block}</p>"))
            .collect()
    }
}

/// A single replica of the shared text document.
pub struct TextDocument {
    doc: Doc,
    content: TextRef,
    replica_id: u64,
}

impl TextDocument {
    pub fn new(replica_id: u64) -> Self {
        let doc = Doc::with_options(Options {
            client_id: replica_id,
            offset_kind: OffsetKind::Utf16,
            ..Options::default()
        });
        let content = doc.get_or_insert_text(CONTENT);
        Self {
            doc,
            content,
            replica_id,
        }
    }

    pub fn replica_id(&self) -> u64 {
        self.replica_id
    }

    /// Current text content.
    pub fn content(&self) -> String {
        let txn = self.doc.transact();
        self.content.get_string(&txn)
    }

    /// Run a local edit in a single transaction and return its delta.
    pub fn edit<F>(&mut self, f: F) -> Vec<u8>
    where
        F: FnOnce(&mut TextEditor<'_>),
    {
        let mut editor = TextEditor {
            text: &self.content,
            txn: self.doc.transact_mut(),
        };
        f(&mut editor);
        editor.txn.encode_update_v1()
    }

    /// Encoded state vector (what this replica has seen from each client).
    pub fn state_vector(&self) -> Vec<u8> {
        self.doc.transact().state_vector().encode_v1()
    }
}

impl ReplicatedLog for TextDocument {
    type Snapshot = DocumentSnapshot;

    fn new_replica(replica_id: u64) -> Self {
        Self::new(replica_id)
    }

    fn local_update(&self) -> Vec<u8> {
        let txn = self.doc.transact();
        txn.encode_state_as_update_v1(&StateVector::default())
    }

    fn apply(&mut self, update: &[u8], origin: &UpdateOrigin) -> Result<(), LogError> {
        let decoded = Update::decode_v1(update).map_err(|e| LogError::Decode(e.to_string()))?;

        let mut txn = self.doc.transact_mut();
        txn.apply_update(decoded)
            .map_err(|e| LogError::Apply(e.to_string()))?;

        log::trace!(
            "replica {} applied {} bytes ({origin:?})",
            self.replica_id,
            update.len()
        );
        Ok(())
    }

    fn merge(&self, updates: &[Vec<u8>]) -> Result<Vec<u8>, LogError> {
        let slices: Vec<&[u8]> = updates.iter().map(Vec::as_slice).collect();
        yrs::merge_updates_v1(&slices).map_err(|e| LogError::Merge(e.to_string()))
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::from_content(self.content())
    }
}

/// Mutation handle for one local edit transaction.
///
/// Positions and lengths count Unicode scalar values (`char`s) and are
/// clamped to the current length, so edits never split a character and
/// never panic on out-of-range positions.
pub struct TextEditor<'a> {
    text: &'a TextRef,
    txn: TransactionMut<'a>,
}

impl<'a> TextEditor<'a> {
    /// Length in characters.
    pub fn len(&self) -> u32 {
        self.content().chars().count() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.len(&self.txn) == 0
    }

    pub fn content(&self) -> String {
        self.text.get_string(&self.txn)
    }

    pub fn insert(&mut self, index: u32, chunk: &str) {
        let content = self.content();
        let offset = utf16_offset(&content, index);
        self.text.insert(&mut self.txn, offset, chunk);
    }

    pub fn push(&mut self, chunk: &str) {
        self.text.push(&mut self.txn, chunk);
    }

    pub fn remove(&mut self, index: u32, len: u32) {
        let content = self.content();
        let start = utf16_offset(&content, index);
        let end = utf16_offset(&content, index.saturating_add(len));
        if end > start {
            self.text.remove_range(&mut self.txn, start, end - start);
        }
    }

    pub fn clear(&mut self) {
        let len = self.text.len(&self.txn);
        if len > 0 {
            self.text.remove_range(&mut self.txn, 0, len);
        }
    }

    /// Replace the whole document with `text`.
    pub fn set_content(&mut self, text: &str) {
        self.clear();
        self.push(text);
    }
}

/// UTF-16 offset of the `chars`-th character, clamped to the end of `content`.
fn utf16_offset(content: &str, chars: u32) -> u32 {
    content
        .chars()
        .take(chars as usize)
        .map(char::len_utf16)
        .sum::<usize>() as u32
}
