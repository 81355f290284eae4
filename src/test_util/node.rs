use std::sync::Arc;

use crate::router::config::RouterConfig;
use crate::router::peer_name::PeerName;
use crate::router::Router;
use crate::test_util::connection::LoopbackConnection;
use crate::test_util::overlay::MockOverlay;


/// One in-process mesh peer: a router on top of a scriptable overlay. Wire several of these
///  together with [TestNode::connect_to] to build multi-hop topologies.
pub struct TestNode {
    pub name: PeerName,
    pub overlay: Arc<MockOverlay>,
    pub router: Arc<Router>,
}

impl TestNode {
    pub fn new(name: PeerName) -> TestNode {
        let overlay = MockOverlay::new(name);
        let router = Arc::new(Router::new(RouterConfig::new(), overlay.clone()));
        TestNode {
            name,
            overlay,
            router,
        }
    }

    /// Adds a one-way link from this peer to `other`: frames sent on the returned connection
    ///  land in `other`'s router. Call it on both nodes for a bidirectional link.
    pub fn connect_to(&self, other: &TestNode, conn_id: u64) -> Arc<LoopbackConnection> {
        let conn = LoopbackConnection::new(conn_id, other.name, other.router.clone());
        self.overlay.add_connection(conn.clone());
        conn
    }
}
