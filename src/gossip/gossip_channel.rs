use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::gossip::gossip_frames::{encode_frame, encode_unicast_frame};
use crate::gossip::gossip_sender::GossipSender;
use crate::gossip::{channel_hash, GossipData, Gossiper};
use crate::router::overlay::{Connection, ConnectionId, Overlay};
use crate::router::peer_name::PeerName;
use crate::router::protocol::{ProtocolMsg, ProtocolTag};
use crate::util::buf::try_get_bytes;


/// The per-tag inbound surface of a channel plus the anti-entropy push entry points, object
///  safe so the router can keep channels with different [Gossiper] types in one registry.
#[async_trait::async_trait]
pub(crate) trait ChannelSlot: Send + Sync + 'static {
    async fn deliver_gossip_unicast(&self, src: PeerName, orig: Bytes, rest: Bytes) -> anyhow::Result<()>;

    async fn deliver_gossip_broadcast(&self, src: PeerName, orig: Bytes, rest: Bytes) -> anyhow::Result<()>;

    async fn deliver_gossip(&self, src: PeerName, rest: Bytes) -> anyhow::Result<()>;

    /// One anti-entropy round: pull the gossiper's full state and push it to all neighbours.
    async fn gossip_periodically(&self);

    /// Push the gossiper's full state down one specific (typically new) connection.
    async fn gossip_down(&self, conn: &Arc<dyn Connection>);
}


/// A named, isolated gossip stream. Owns one [GossipSender] per live connection; the sender
///  map is the only state behind the channel mutex.
pub struct GossipChannel<G: Gossiper> {
    name: String,
    hash: u32,
    ourself: PeerName,
    overlay: Arc<dyn Overlay>,
    gossiper: G,
    senders: Mutex<FxHashMap<ConnectionId, GossipSender<G::Data>>>,
}

impl<G: Gossiper> GossipChannel<G> {
    pub(crate) fn new(name: &str, ourself: PeerName, overlay: Arc<dyn Overlay>, gossiper: G) -> GossipChannel<G> {
        GossipChannel {
            name: name.to_string(),
            hash: channel_hash(name),
            ourself,
            overlay,
            gossiper,
            senders: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Sends `payload` to the named peer, relayed over the unicast topology by the peers in
    ///  between.
    pub async fn gossip_unicast(&self, dst: PeerName, payload: &[u8]) -> anyhow::Result<()> {
        let frame = encode_unicast_frame(self.hash, self.ourself, dst, payload);
        self.relay_gossip_unicast(dst, frame).await;
        Ok(())
    }

    /// Sends `payload` to every reachable peer, relayed over the broadcast topology.
    pub async fn gossip_broadcast(&self, payload: &[u8]) -> anyhow::Result<()> {
        let frame = encode_frame(self.hash, self.ourself, payload);
        self.relay_gossip_broadcast(self.ourself, frame).await;
        Ok(())
    }

    /// Hands `data` to the sender of every current connection. Afterwards the sender map
    ///  holds exactly the connections of the snapshot taken here: senders for connections
    ///  that have vanished from the overlay are stopped and discarded.
    pub fn send_gossip(&self, data: G::Data) {
        // snapshot outside the mutex so the overlay's locks never nest inside ours
        let connections = self.overlay.connections();

        let mut senders = self.senders.lock().unwrap();
        let mut retained = FxHashMap::default();
        for conn in &connections {
            let sender = match senders.remove(&conn.id()) {
                Some(sender) => sender,
                None => self.new_sender(conn),
            };
            sender.send(data.clone());
            retained.insert(conn.id(), sender);
        }

        for sender in senders.values() {
            sender.stop();
        }
        *senders = retained;
    }

    /// Hands `data` to one connection's sender, creating the sender if this is the first
    ///  send on that connection.
    pub fn send_gossip_down(&self, conn: &Arc<dyn Connection>, data: G::Data) {
        let mut senders = self.senders.lock().unwrap();
        senders
            .entry(conn.id())
            .or_insert_with(|| self.new_sender(conn))
            .send(data);
    }

    fn new_sender(&self, conn: &Arc<dyn Connection>) -> GossipSender<G::Data> {
        let conn = conn.clone();
        let channel_hash = self.hash;
        let ourself = self.ourself;

        GossipSender::start(move |pending: G::Data| {
            let conn = conn.clone();
            async move {
                let mut payload = BytesMut::new();
                pending.encode(&mut payload);
                let frame = encode_frame(channel_hash, ourself, &payload);
                conn.send_protocol_msg(ProtocolMsg {
                    tag: ProtocolTag::Gossip,
                    payload: frame,
                })
                .await;
            }
        })
    }

    /// Forwards `frame` one hop towards `dst`. Missing routes and missing connections are
    ///  transient mesh state: the frame is dropped and the next anti-entropy round repairs
    ///  the loss.
    async fn relay_gossip_unicast(&self, dst: PeerName, frame: Bytes) {
        match self.overlay.unicast_route_to(dst) {
            None => debug!(channel = %self.name, %dst, "no unicast route to destination - dropping"),
            Some(relay) => match self.overlay.connection_to(relay) {
                None => debug!(channel = %self.name, %relay, "no connection to relay peer - dropping"),
                Some(conn) => {
                    conn.send_protocol_msg(ProtocolMsg {
                        tag: ProtocolTag::GossipUnicast,
                        payload: frame,
                    })
                    .await
                }
            },
        }
    }

    /// Forwards `frame` on the broadcast next hops for `origin`. Only those connections
    ///  forward, so every peer sees each broadcast on exactly one link per origin.
    async fn relay_gossip_broadcast(&self, origin: PeerName, frame: Bytes) {
        match self.overlay.next_broadcast_hops(origin) {
            None => debug!(channel = %self.name, %origin, "cannot relay broadcast from unknown peer - dropping"),
            Some(hops) => {
                let msg = ProtocolMsg {
                    tag: ProtocolTag::GossipBroadcast,
                    payload: frame,
                };
                for conn in hops {
                    conn.send_protocol_msg(msg.clone()).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl<G: Gossiper> ChannelSlot for GossipChannel<G> {
    async fn deliver_gossip_unicast(&self, src: PeerName, orig: Bytes, mut rest: Bytes) -> anyhow::Result<()> {
        let dst = PeerName::try_deser(&mut rest)?;
        if dst != self.ourself {
            // forward the original bytes untouched so the source field stays the origin
            self.relay_gossip_unicast(dst, orig).await;
            return Ok(());
        }

        let payload = try_get_bytes(&mut rest)?;
        self.gossiper.on_gossip_unicast(src, payload).await
    }

    async fn deliver_gossip_broadcast(&self, src: PeerName, orig: Bytes, mut rest: Bytes) -> anyhow::Result<()> {
        let payload = try_get_bytes(&mut rest)?;

        // a payload the local application rejects is not forwarded
        self.gossiper.on_gossip_broadcast(payload).await?;

        self.relay_gossip_broadcast(src, orig).await;
        Ok(())
    }

    async fn deliver_gossip(&self, _src: PeerName, mut rest: Bytes) -> anyhow::Result<()> {
        let payload = try_get_bytes(&mut rest)?;

        if let Some(delta) = self.gossiper.on_gossip(payload).await? {
            // re-gossip only what was new to us; peers with nothing to add stay silent,
            //  which is what makes the exchange quiesce
            self.send_gossip(delta);
        }
        Ok(())
    }

    async fn gossip_periodically(&self) {
        let data = self.gossiper.gossip().await;
        self.send_gossip(data);
    }

    async fn gossip_down(&self, conn: &Arc<dyn Connection>) {
        let data = self.gossiper.gossip().await;
        self.send_gossip_down(conn, data);
    }
}
