//! Wire layouts of the three gossip frame kinds. Every frame starts with the channel hash
//!  and the *originating* peer's name - relaying peers forward frames byte for byte, so the
//!  source field never changes in flight.

use bytes::{BufMut, Bytes, BytesMut};

use crate::router::peer_name::PeerName;
use crate::util::buf::put_bytes;


/// Frame layout for `GossipBroadcast` and `Gossip` tags: channel hash, source name, payload.
pub fn encode_frame(channel_hash: u32, src: PeerName, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u32(channel_hash);
    src.ser(&mut buf);
    put_bytes(&mut buf, payload);
    buf.freeze()
}

/// Frame layout for the `GossipUnicast` tag: channel hash, source name, destination name,
///  payload.
pub fn encode_unicast_frame(channel_hash: u32, src: PeerName, dst: PeerName, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u32(channel_hash);
    src.ser(&mut buf);
    dst.ser(&mut buf);
    put_bytes(&mut buf, payload);
    buf.freeze()
}

#[cfg(test)]
mod test {
    use bytes::Buf;

    use crate::util::buf::try_get_bytes;
    use super::*;

    #[test]
    fn test_frame_layout() {
        let mut frame = encode_frame(0xdeadbeef, PeerName::new(7), b"payload");

        assert_eq!(bytes::Buf::try_get_u32(&mut frame).unwrap(), 0xdeadbeef);
        assert_eq!(PeerName::try_deser(&mut frame).unwrap(), PeerName::new(7));
        assert_eq!(try_get_bytes(&mut frame).unwrap(), Bytes::from_static(b"payload"));
        assert!(!frame.has_remaining());
    }

    #[test]
    fn test_unicast_frame_layout() {
        let mut frame = encode_unicast_frame(17, PeerName::new(1), PeerName::new(2), b"hi");

        assert_eq!(bytes::Buf::try_get_u32(&mut frame).unwrap(), 17);
        assert_eq!(PeerName::try_deser(&mut frame).unwrap(), PeerName::new(1));
        assert_eq!(PeerName::try_deser(&mut frame).unwrap(), PeerName::new(2));
        assert_eq!(try_get_bytes(&mut frame).unwrap(), Bytes::from_static(b"hi"));
        assert!(!frame.has_remaining());
    }
}
