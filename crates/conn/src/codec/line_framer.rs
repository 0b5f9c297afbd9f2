//! Newline framing for the line protocol.

use bytes::Bytes;

use crate::buffer::{BufferError, GrowableBuffer};
use crate::codec::Framer;

/// Frames `\n`-terminated messages; the delimiter stays part of the frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineFramer;

impl LineFramer {
    pub fn new() -> Self {
        Self
    }
}

impl Framer for LineFramer {
    type Item = Bytes;
    type Error = BufferError;

    fn decode(&mut self, src: &mut GrowableBuffer) -> Result<Option<Self::Item>, Self::Error> {
        match src.view().iter().position(|b| *b == b'\n') {
            Some(index) => src.split_to(index + 1).map(Some),
            None => Ok(None),
        }
    }
}
