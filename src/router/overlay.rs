use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::router::peer_name::PeerName;
use crate::router::protocol::ProtocolMsg;


/// Identity of a live connection, stable for the lifetime of the link. The overlay assigns
///  these; the gossip core uses them as map keys. A reconnect to the same peer yields a new
///  [ConnectionId].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConnectionId(pub u64);

impl Debug for ConnectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}


/// A live outbound link to a direct neighbour, owned by the overlay. The gossip core only
///  ever hands frames to it; transport errors, timeouts and teardown are the overlay's
///  business and are not reported back here.
#[async_trait::async_trait]
pub trait Connection: Send + Sync + 'static {
    fn id(&self) -> ConnectionId;

    fn remote_name(&self) -> PeerName;

    /// Must be safe for concurrent callers; may exert backpressure by suspending.
    async fn send_protocol_msg(&self, msg: ProtocolMsg);
}


/// The overlay surface the gossip core consumes: the local peer's identity and connection
///  set, plus the routing decisions the overlay derives from the mesh topology.
///
/// All methods are snapshot reads. The overlay takes its own locks internally, which is why
///  callers in the gossip core never invoke them while holding a channel mutex.
pub trait Overlay: Send + Sync + 'static {
    fn local_name(&self) -> PeerName;

    /// Snapshot of all live connections to direct neighbours.
    fn connections(&self) -> Vec<Arc<dyn Connection>>;

    fn connection_to(&self, peer: PeerName) -> Option<Arc<dyn Connection>>;

    /// Next hop on the unicast route towards `dst`, or `None` if the routing tables have no
    ///  entry for it.
    fn unicast_route_to(&self, dst: PeerName) -> Option<PeerName>;

    /// The connections on which this peer is obliged to forward a broadcast originated by
    ///  `origin`, per the overlay's broadcast spanning tree. `None` means `origin` is not in
    ///  the peer table at all, as opposed to a known origin with nothing to forward.
    fn next_broadcast_hops(&self, origin: PeerName) -> Option<Vec<Arc<dyn Connection>>>;
}
