//! The router side of the gossip core: the channel registry, the inbound dispatcher that
//!  classifies framed messages by protocol tag and channel hash, and the periodic driver
//!  for anti-entropy rounds.

use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use bytes::{Buf, Bytes};
use rustc_hash::FxHashMap;
use tokio::time::sleep;
use tracing::debug;

use crate::gossip::gossip_channel::{ChannelSlot, GossipChannel};
use crate::gossip::Gossiper;
use crate::router::config::RouterConfig;
use crate::router::overlay::{Connection, Overlay};
use crate::router::peer_name::PeerName;
use crate::router::protocol::ProtocolTag;

pub mod config;
pub mod overlay;
pub mod peer_name;
pub mod protocol;


pub struct Router {
    config: RouterConfig,
    ourself: PeerName,
    overlay: Arc<dyn Overlay>,
    /// registered at startup, read-only afterwards; the lock is never held across an await
    channels: RwLock<FxHashMap<u32, Arc<dyn ChannelSlot>>>,
}

impl Router {
    pub fn new(config: RouterConfig, overlay: Arc<dyn Overlay>) -> Router {
        Router {
            config,
            ourself: overlay.local_name(),
            overlay,
            channels: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn local_name(&self) -> PeerName {
        self.ourself
    }

    /// Registers a gossip channel under `channel_name`. Channels are identified on the wire
    ///  by the hash of their name, so a second registration with the same hash - usually the
    ///  same name, conceivably a collision - is refused.
    pub fn new_gossip<G: Gossiper>(&self, channel_name: &str, gossiper: G) -> anyhow::Result<Arc<GossipChannel<G>>> {
        let channel = Arc::new(GossipChannel::new(channel_name, self.ourself, self.overlay.clone(), gossiper));

        match self.channels.write().unwrap().entry(channel.hash()) {
            Entry::Occupied(_) => Err(anyhow!(
                "registering gossip channel {:?}: hash {:08x} is already taken",
                channel_name,
                channel.hash()
            )),
            Entry::Vacant(e) => {
                let _ = e.insert(channel.clone());
                Ok(channel)
            }
        }
    }

    /// Classifies an inbound gossip frame and hands it to the right channel. Errors are for
    ///  the transport layer to log; the connection is not torn down over them.
    pub async fn handle_gossip(&self, tag: ProtocolTag, payload: Bytes) -> anyhow::Result<()> {
        let mut buf = payload.clone();
        let channel_hash = Buf::try_get_u32(&mut buf)?;

        let channel = self
            .channels
            .read()
            .unwrap()
            .get(&channel_hash)
            .cloned()
            .ok_or_else(|| anyhow!("received gossip for unknown channel hash {:08x}", channel_hash))?;

        let src = PeerName::try_deser(&mut buf)?;

        match tag {
            ProtocolTag::GossipUnicast => channel.deliver_gossip_unicast(src, payload, buf).await,
            ProtocolTag::GossipBroadcast => channel.deliver_gossip_broadcast(src, payload, buf).await,
            ProtocolTag::Gossip => channel.deliver_gossip(src, buf).await,
            // anything else on the wire belongs to the overlay
            _ => Ok(()),
        }
    }

    /// One anti-entropy round: push every channel's full gossiper state to all current
    ///  neighbours.
    pub async fn send_all_gossip(&self) {
        for channel in self.gossip_channels() {
            channel.gossip_periodically().await;
        }
    }

    /// Pushes every channel's full state down one specific connection. The overlay calls
    ///  this when a new connection comes up so the new neighbour converges without waiting
    ///  for the next periodic round.
    pub async fn send_all_gossip_down(&self, conn: &Arc<dyn Connection>) {
        for channel in self.gossip_channels() {
            channel.gossip_down(conn).await;
        }
    }

    fn gossip_channels(&self) -> Vec<Arc<dyn ChannelSlot>> {
        self.channels.read().unwrap().values().cloned().collect()
    }

    /// Fires an anti-entropy round every `gossip_interval`, forever. Meant to be spawned by
    ///  the embedding process.
    pub async fn run_gossip_loop(&self) {
        loop {
            sleep(self.config.gossip_interval).await;
            debug!("periodic gossip");
            self.send_all_gossip().await;
        }
    }
}
