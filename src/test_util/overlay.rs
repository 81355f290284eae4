use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::router::overlay::{Connection, ConnectionId, Overlay};
use crate::router::peer_name::PeerName;


/// A scriptable [Overlay]: tests add and remove connections, plant unicast routes and
///  broadcast next hops, and the gossip core under test consumes them like the real thing.
pub struct MockOverlay {
    ourself: PeerName,
    state: Mutex<OverlayState>,
}

#[derive(Default)]
struct OverlayState {
    connections: Vec<Arc<dyn Connection>>,
    unicast_routes: FxHashMap<PeerName, PeerName>,
    broadcast_hops: FxHashMap<PeerName, Vec<Arc<dyn Connection>>>,
}

impl MockOverlay {
    pub fn new(ourself: PeerName) -> Arc<MockOverlay> {
        Arc::new(MockOverlay {
            ourself,
            state: Mutex::new(OverlayState::default()),
        })
    }

    pub fn add_connection(&self, conn: Arc<dyn Connection>) {
        self.state.lock().unwrap().connections.push(conn);
    }

    pub fn remove_connection(&self, id: ConnectionId) {
        self.state.lock().unwrap().connections.retain(|conn| conn.id() != id);
    }

    /// Declares that frames for `dst` leave this peer towards the neighbour `next_hop`.
    pub fn set_unicast_route(&self, dst: PeerName, next_hop: PeerName) {
        self.state.lock().unwrap().unicast_routes.insert(dst, next_hop);
    }

    /// Declares the links this peer forwards on for broadcasts originated by `origin`. An
    ///  empty list still marks `origin` as known in the peer table.
    pub fn set_broadcast_hops(&self, origin: PeerName, hops: Vec<Arc<dyn Connection>>) {
        self.state.lock().unwrap().broadcast_hops.insert(origin, hops);
    }
}

impl Overlay for MockOverlay {
    fn local_name(&self) -> PeerName {
        self.ourself
    }

    fn connections(&self) -> Vec<Arc<dyn Connection>> {
        self.state.lock().unwrap().connections.clone()
    }

    fn connection_to(&self, peer: PeerName) -> Option<Arc<dyn Connection>> {
        self.state
            .lock()
            .unwrap()
            .connections
            .iter()
            .find(|conn| conn.remote_name() == peer)
            .cloned()
    }

    fn unicast_route_to(&self, dst: PeerName) -> Option<PeerName> {
        self.state.lock().unwrap().unicast_routes.get(&dst).copied()
    }

    fn next_broadcast_hops(&self, origin: PeerName) -> Option<Vec<Arc<dyn Connection>>> {
        self.state.lock().unwrap().broadcast_hops.get(&origin).cloned()
    }
}
