//! Evolution ledger
//!
//! Append-only record of every metamorphosis. Each block carries a SHA-256
//! content hash over `(subject, timestamp, transition, integration, index)`.
//!
//! With [`HashLinkage::Chained`] (the default) the previous block's hash is
//! folded into each digest, so editing or dropping a block breaks every later
//! hash. [`HashLinkage::Independent`] hashes each block on its own and only
//! detects edits to that block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::LedgerError;
use crate::hash::ContentHash;

/// How block hashes relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HashLinkage {
    #[default]
    Chained,
    Independent,
}

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBlock {
    /// Position in the ledger (chain length at append time)
    pub index: u64,
    /// Node identifier, or the population subject for mode switches
    pub subject: String,
    pub from: String,
    pub to: String,
    /// `"<from> -> <to>"`
    pub transition: String,
    /// Integration measure at the time of the transition
    pub integration: f64,
    pub timestamp: DateTime<Utc>,
    pub hash: ContentHash,
    pub previous_hash: Option<ContentHash>,
}

impl LedgerBlock {
    /// Fixed-length display form of the block hash
    pub fn short_hash(&self) -> String {
        self.hash.short()
    }

    fn content(&self) -> String {
        block_content(
            &self.subject,
            self.timestamp,
            &self.transition,
            self.integration,
            self.index,
        )
    }

    fn expected_hash(&self) -> ContentHash {
        let content = self.content();
        match &self.previous_hash {
            Some(prev) => ContentHash::chain(prev, content.as_bytes()),
            None => ContentHash::digest(content.as_bytes()),
        }
    }
}

fn block_content(
    subject: &str,
    timestamp: DateTime<Utc>,
    transition: &str,
    integration: f64,
    index: u64,
) -> String {
    format!(
        "{}|{}|{}|{:?}|{}",
        subject,
        timestamp.timestamp_millis(),
        transition,
        integration,
        index
    )
}

/// Append-only transition log owned by one simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionLedger {
    linkage: HashLinkage,
    blocks: Vec<LedgerBlock>,
}

impl EvolutionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linkage(linkage: HashLinkage) -> Self {
        Self {
            linkage,
            blocks: Vec::new(),
        }
    }

    pub fn linkage(&self) -> HashLinkage {
        self.linkage
    }

    /// Append a transition and return the new block
    pub fn record(
        &mut self,
        subject: impl Into<String>,
        from: impl Display,
        to: impl Display,
        integration: f64,
    ) -> &LedgerBlock {
        let subject = subject.into();
        let from = from.to_string();
        let to = to.to_string();
        let transition = format!("{} -> {}", from, to);
        let index = self.blocks.len() as u64;
        let timestamp = Utc::now();

        let previous_hash = match self.linkage {
            HashLinkage::Chained => self.blocks.last().map(|b| b.hash.clone()),
            HashLinkage::Independent => None,
        };
        let content = block_content(&subject, timestamp, &transition, integration, index);
        let hash = match &previous_hash {
            Some(prev) => ContentHash::chain(prev, content.as_bytes()),
            None => ContentHash::digest(content.as_bytes()),
        };

        tracing::debug!(
            index,
            subject = %subject,
            transition = %transition,
            hash = %hash,
            "Ledger block appended"
        );
        metrics::counter!("arkhe_ledger_blocks_total").increment(1);

        self.blocks.push(LedgerBlock {
            index,
            subject,
            from,
            to,
            transition,
            integration,
            timestamp,
            hash,
            previous_hash,
        });
        &self.blocks[self.blocks.len() - 1]
    }

    /// The most recent `n` blocks, oldest first
    pub fn recent(&self, n: usize) -> &[LedgerBlock] {
        let start = self.blocks.len().saturating_sub(n);
        &self.blocks[start..]
    }

    pub fn blocks(&self) -> &[LedgerBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerBlock> {
        self.blocks.iter()
    }

    pub fn last(&self) -> Option<&LedgerBlock> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Recompute every hash and link; reports the first inconsistent block
    pub fn verify(&self) -> Result<(), LedgerError> {
        let mut previous: Option<&ContentHash> = None;
        for (i, block) in self.blocks.iter().enumerate() {
            let index = block.index;
            if index != i as u64 {
                return Err(LedgerError::OutOfSequence { index });
            }
            let expected_link = match self.linkage {
                HashLinkage::Chained => previous,
                HashLinkage::Independent => None,
            };
            if block.previous_hash.as_ref() != expected_link {
                return Err(LedgerError::BrokenLink { index });
            }
            if block.expected_hash() != block.hash {
                return Err(LedgerError::HashMismatch { index });
            }
            previous = Some(&block.hash);
        }
        Ok(())
    }
}
