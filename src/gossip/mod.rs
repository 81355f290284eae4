//! Named gossip channels over the mesh overlay. Each channel gives its application three
//!  delivery modes: point-to-point unicast relayed hop by hop, topology-aware broadcast
//!  flooding, and a periodic anti-entropy exchange that converges arbitrary mergeable state.

use bytes::{Bytes, BytesMut};

use crate::router::peer_name::PeerName;

pub mod gossip_channel;
pub(crate) mod gossip_frames;
pub mod gossip_sender;


/// Mergeable, encodable application state carried by the anti-entropy protocol.
///
/// `merge` must be idempotent and commutative up to idempotence: merging any permutation of
///  the same set of updates must end in the same state. Anti-entropy convergence depends on
///  it - updates are re-merged freely as they travel the mesh.
///
/// A single datum fans out to every neighbour's outbox, each of which owns its copy; that is
///  what `Clone` is for.
pub trait GossipData: Clone + Send + 'static {
    /// Merges `other` into `self` in place.
    fn merge(&mut self, other: Self);

    /// Writes a self-describing serialization that any peer on the channel can decode.
    fn encode(&self, buf: &mut BytesMut);
}


/// The application half of a gossip channel, one per channel. The channel calls inbound
///  payloads through here and pulls state snapshots for the periodic anti-entropy rounds.
#[async_trait::async_trait]
pub trait Gossiper: Send + Sync + 'static {
    type Data: GossipData;

    async fn on_gossip_unicast(&self, src: PeerName, payload: Bytes) -> anyhow::Result<()>;

    /// An error here suppresses relaying: a payload the local application rejects is not
    ///  forwarded to neighbours.
    async fn on_gossip_broadcast(&self, payload: Bytes) -> anyhow::Result<()>;

    /// Snapshot of everything this gossiper knows; called once per anti-entropy round.
    async fn gossip(&self) -> Self::Data;

    /// Merges a received gossip payload into local state, returning just the part that was
    ///  new, or `None` if the payload taught us nothing. Only the delta is re-gossiped, which
    ///  is what makes gossip quiesce once the mesh has converged.
    async fn on_gossip(&self, payload: Bytes) -> anyhow::Result<Option<Self::Data>>;
}


/// Deterministic 32-bit FNV-1a hash of a channel name. Channels are identified on the wire
///  by this hash alone, so every peer must compute it identically; name collisions are a
///  configuration bug caught at registration.
pub fn channel_hash(channel_name: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for b in channel_name.as_bytes() {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use super::*;

    #[rstest]
    #[case::offset_basis("", 0x811c9dc5)]
    #[case::reference_vector("a", 0xe40c292c)]
    #[case::reference_vector_foobar("foobar", 0xbf9cf968)]
    fn test_channel_hash(#[case] name: &str, #[case] expected: u32) {
        assert_eq!(channel_hash(name), expected);
    }

    #[test]
    fn test_channel_hash_distinguishes_names() {
        assert_ne!(channel_hash("topology"), channel_hash("ipam"));
    }
}
