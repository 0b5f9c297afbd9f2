use crate::buffer::GrowableBuffer;

/// Extracts complete frames from the front of a [`GrowableBuffer`].
///
/// Shaped like `tokio_util::codec::Decoder`, but over the connection's own
/// buffer. Callers loop "try decode, else read more", since one transport chunk
/// may carry several frames.
pub trait Framer {
    type Item;
    type Error;

    /// Attempts to take one frame off `src`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))`: a complete frame, its bytes already evicted from `src`
    /// - `Ok(None)`: incomplete, more bytes are needed
    /// - `Err(_)`: the buffered bytes can never form a valid frame
    fn decode(&mut self, src: &mut GrowableBuffer) -> Result<Option<Self::Item>, Self::Error>;
}
