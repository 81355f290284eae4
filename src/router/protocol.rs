use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};


/// One-byte discriminator in front of every framed message on a mesh connection. The gossip
///  core handles the three gossip tags; the rest belong to the overlay and share the numbering
///  so that a single decoder can classify any frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ProtocolTag {
    Heartbeat = 0,
    ConnectionEstablished = 1,
    GossipUnicast = 2,
    GossipBroadcast = 3,
    Gossip = 4,
}

/// A framed message as handed to a connection: the tag plus the complete frame bytes after
///  the tag. Cloning is cheap, so one message can be fanned out to several connections.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolMsg {
    pub tag: ProtocolTag,
    pub payload: Bytes,
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use super::*;

    #[rstest]
    #[case::gossip_unicast(2, Some(ProtocolTag::GossipUnicast))]
    #[case::gossip_broadcast(3, Some(ProtocolTag::GossipBroadcast))]
    #[case::gossip(4, Some(ProtocolTag::Gossip))]
    #[case::out_of_range(200, None)]
    fn test_tag_from_u8(#[case] raw: u8, #[case] expected: Option<ProtocolTag>) {
        assert_eq!(ProtocolTag::try_from(raw).ok(), expected);
    }
}
