//! Radio transport port

use trait_variant::make;

use crate::core::error::TransportResult;

/// Device to peer side of the radio link
///
/// The peer to device direction is not part of this trait. Adapters receive an
/// [`InboundSender`](crate::core::queue::InboundSender) at construction and push
/// every received frame into it.
#[make(Send)]
pub trait RadioTransport: Sync + 'static {
    /// Send one frame to the connected peer as a single notification
    async fn send(&self, frame: &[u8]) -> TransportResult<()>;
}
