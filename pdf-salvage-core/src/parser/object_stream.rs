//! PDF Object Stream Parser
//!
//! Handles compressed objects stored in object streams (PDF 1.5+)

use super::lexer::{Lexer, Token};
use super::store::RawObject;
use super::{ParseError, ParseResult};

/// Upper bound on `/N`, so a corrupt header cannot drive a huge allocation
const MAX_OBJECTS_PER_STREAM: usize = 1 << 20;

/// Represents a PDF object stream containing compressed objects
#[derive(Debug)]
pub struct ObjectStream<'a> {
    /// Decoded stream data
    data: &'a [u8],
    /// Offset of first object
    first: usize,
    /// (object number, offset relative to `first`) pairs from the header
    offsets: Vec<(u32, usize)>,
}

impl<'a> ObjectStream<'a> {
    /// Parse the header of an object stream
    pub fn parse(container: &'a RawObject) -> ParseResult<Self> {
        if !container.pending_filters().is_empty() {
            return Err(ParseError::StreamDecodeError(format!(
                "object stream still encoded with {:?}",
                container.pending_filters()
            )));
        }
        let data = container
            .stream()
            .ok_or_else(|| ParseError::StreamDecodeError("object stream has no data".to_string()))?;

        let n = container
            .get("N")
            .and_then(|obj| obj.as_integer())
            .filter(|n| *n >= 0)
            .ok_or_else(|| ParseError::MissingKey("N".to_string()))? as usize;

        let first = container
            .get("First")
            .and_then(|obj| obj.as_integer())
            .filter(|f| *f >= 0)
            .ok_or_else(|| ParseError::MissingKey("First".to_string()))? as usize;

        if first > data.len() {
            return Err(ParseError::SyntaxError {
                position: first,
                message: "First offset beyond object stream data".to_string(),
            });
        }

        // Read object number/offset pairs
        let mut lexer = Lexer::new(&data[..first]);
        let mut offsets = Vec::with_capacity(n.min(MAX_OBJECTS_PER_STREAM));
        while offsets.len() < n.min(MAX_OBJECTS_PER_STREAM) {
            match (lexer.next_token(), lexer.next_token()) {
                (Some(Token::Number(num)), Some(Token::Number(offset)))
                    if num >= 0.0 && offset >= 0.0 =>
                {
                    offsets.push((num as u32, offset as usize));
                }
                _ => break,
            }
        }

        if offsets.len() < n {
            tracing::debug!(
                "Object stream header lists {} of {} objects",
                offsets.len(),
                n
            );
        }

        Ok(ObjectStream {
            data,
            first,
            offsets,
        })
    }

    /// Number of objects listed in the header
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Object number listed at `index`
    pub fn object_number_at(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).map(|(num, _)| *num)
    }

    /// Extract the object at `index` of the header table
    pub fn object_at(&self, index: usize) -> Option<RawObject> {
        let &(num, offset) = self.offsets.get(index)?;
        let start = self.first.checked_add(offset)?;
        if start > self.data.len() {
            return None;
        }
        // An object ends where the next one begins
        let end = self
            .offsets
            .get(index + 1)
            .and_then(|(_, next)| self.first.checked_add(*next))
            .filter(|end| *end >= start && *end <= self.data.len())
            .unwrap_or(self.data.len());

        Some(RawObject::new(num, 0, self.data[start..end].to_vec()))
    }

    /// Extract object `num`, expected at `index`.
    ///
    /// Falls back to searching the header when the index is stale.
    pub fn get(&self, num: u32, index: u32) -> Option<RawObject> {
        let index = index as usize;
        if self.object_number_at(index) == Some(num) {
            return self.object_at(index);
        }
        let position = self.offsets.iter().position(|(n, _)| *n == num)?;
        self.object_at(position)
    }

    /// Every object in the stream, in header order
    pub fn objects(&self) -> impl Iterator<Item = RawObject> + '_ {
        (0..self.offsets.len()).filter_map(|index| self.object_at(index))
    }
}
