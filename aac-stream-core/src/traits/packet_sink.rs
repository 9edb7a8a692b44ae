use crossbeam_channel::Sender;

use crate::models::packet::EncodedPacket;

/// Downstream consumer of encoded packets.
///
/// Called on the encode lane, in input order. Implementations should hand
/// the packet off quickly; a slow sink stalls encoding.
pub trait PacketSink: Send + Sync {
    fn receive_packet(&self, packet: EncodedPacket);
}

impl PacketSink for Sender<EncodedPacket> {
    fn receive_packet(&self, packet: EncodedPacket) {
        if self.send(packet).is_err() {
            log::debug!("packet receiver dropped; discarding packet");
        }
    }
}
