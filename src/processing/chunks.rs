/*!
Block chunking.

Sentences of the files of a component are gathered into `<treebank>` blocks
whose content stays under a byte threshold.
A block only ever ends at a sentence boundary, so a single sentence larger than the
threshold makes up a block of its own.
!*/
use std::iter::Enumerate;
use std::path::PathBuf;
use std::slice::Iter;

use log::debug;

use crate::error::Error;

use super::metadata::MetadataDiscovery;
use super::sentence::{Normalizer, Sentence};

const BLOCK_START: &str = "<treebank>";
const BLOCK_END: &str = "</treebank>";

/// A block of sentences, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub xml: String,
    pub words: u64,
    pub sentences: u64,
    /// Number of files of the component consumed so far.
    pub files: usize,
}

/// Lazy iterator over the blocks of a component.
///
/// Files are normalized one at a time, when the sentences of the previous one are exhausted.
/// The iterator stops after the first error.
pub struct Blocks<'a> {
    normalizer: &'a Normalizer<'a>,
    discovery: &'a mut MetadataDiscovery,
    component: &'a str,
    files: Enumerate<Iter<'a, PathBuf>>,
    pending: std::vec::IntoIter<Sentence>,
    /// 1-based number of the file `pending` comes from.
    current_file: usize,
    max_size: usize,

    // accumulators
    content: String,
    words: u64,
    sentences: u64,
    /// Files up to the one of the last accumulated sentence, all of them once exhausted.
    files_consumed: usize,
    done: bool,
}

/// Chunk the `files` of `component` into blocks of at most `max_size` bytes of sentences.
pub fn chunk<'a>(
    normalizer: &'a Normalizer<'a>,
    discovery: &'a mut MetadataDiscovery,
    files: &'a [PathBuf],
    component: &'a str,
    max_size: usize,
) -> Blocks<'a> {
    Blocks {
        normalizer,
        discovery,
        component,
        files: files.iter().enumerate(),
        pending: Vec::new().into_iter(),
        current_file: 0,
        max_size,
        content: String::new(),
        words: 0,
        sentences: 0,
        files_consumed: 0,
        done: false,
    }
}

impl<'a> Blocks<'a> {
    /// Add a sentence, returning the previous block if the sentence would not fit in it.
    fn push(&mut self, sentence: Sentence) -> Option<Block> {
        let length = sentence.xml().len();
        let block = if !self.content.is_empty() && self.content.len() + length > self.max_size {
            self.flush()
        } else {
            None
        };

        self.content.push_str(sentence.xml());
        self.words += sentence.words();
        self.sentences += 1;
        self.files_consumed = self.current_file;
        block
    }

    /// Emit the accumulated block, if any, and reset accumulators.
    fn flush(&mut self) -> Option<Block> {
        if self.sentences == 0 {
            return None;
        }

        let content = std::mem::take(&mut self.content);
        let mut xml = String::with_capacity(BLOCK_START.len() + content.len() + BLOCK_END.len());
        xml.push_str(BLOCK_START);
        xml.push_str(&content);
        xml.push_str(BLOCK_END);

        let block = Block {
            xml,
            words: self.words,
            sentences: self.sentences,
            files: self.files_consumed,
        };
        debug!(
            "[{}] block of {} sentences ({} bytes)",
            self.component,
            block.sentences,
            content.len()
        );

        self.words = 0;
        self.sentences = 0;
        Some(block)
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Result<Block, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(sentence) = self.pending.next() {
                if let Some(block) = self.push(sentence) {
                    return Some(Ok(block));
                }
                continue;
            }

            match self.files.next() {
                Some((idx, file)) => {
                    self.current_file = idx + 1;
                    match self
                        .normalizer
                        .normalize(file, idx + 1, self.component, self.discovery)
                    {
                        Ok(sentences) => self.pending = sentences.into_iter(),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                None => {
                    self.done = true;
                    self.files_consumed = self.current_file;
                    return self.flush().map(Ok);
                }
            }
        }
    }
}
