//! Request body framing.
//!
//! Only `Content-Length` framing is supported; [`parse_payload`] turns the
//! request head into a [`PayloadSize`](crate::protocol::PayloadSize) or a
//! client-facing error. Reading the body itself is done by
//! [`BodyReader`](crate::protocol::body::BodyReader).

mod payload_decoder;

pub use payload_decoder::parse_payload;
