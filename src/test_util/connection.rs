use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::router::overlay::{Connection, ConnectionId};
use crate::router::peer_name::PeerName;
use crate::router::protocol::ProtocolMsg;
use crate::router::Router;


/// A connection that records every frame handed to it.
pub struct MockConnection {
    id: ConnectionId,
    remote: PeerName,
    sent: Mutex<Vec<ProtocolMsg>>,
}

impl MockConnection {
    pub fn new(id: u64, remote: PeerName) -> Arc<MockConnection> {
        Arc::new(MockConnection {
            id: ConnectionId(id),
            remote,
            sent: Default::default(),
        })
    }

    pub fn sent(&self) -> Vec<ProtocolMsg> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn remote_name(&self) -> PeerName {
        self.remote
    }

    async fn send_protocol_msg(&self, msg: ProtocolMsg) {
        self.sent.lock().unwrap().push(msg);
    }
}


/// A connection that records frames and delivers them straight into the remote peer's
///  router, so multi-peer topologies can be wired up inside one process.
pub struct LoopbackConnection {
    id: ConnectionId,
    remote: PeerName,
    target: Arc<Router>,
    sent: Mutex<Vec<ProtocolMsg>>,
}

impl LoopbackConnection {
    pub fn new(id: u64, remote: PeerName, target: Arc<Router>) -> Arc<LoopbackConnection> {
        Arc::new(LoopbackConnection {
            id: ConnectionId(id),
            remote,
            target,
            sent: Default::default(),
        })
    }

    pub fn sent(&self) -> Vec<ProtocolMsg> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Connection for LoopbackConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn remote_name(&self) -> PeerName {
        self.remote
    }

    async fn send_protocol_msg(&self, msg: ProtocolMsg) {
        self.sent.lock().unwrap().push(msg.clone());
        if let Err(e) = self.target.handle_gossip(msg.tag, msg.payload).await {
            debug!(remote = %self.remote, "remote peer rejected frame: {:#}", e);
        }
    }
}
