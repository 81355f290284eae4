use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use bytes::{Buf, Bytes, BytesMut};
use bytes_varint::{VarIntSupport, VarIntSupportMut};
use rustc_hash::FxHashSet;

use crate::gossip::{GossipData, Gossiper};
use crate::router::peer_name::PeerName;


/// A set of numbers under union. Union is idempotent and commutative, which is exactly what
///  [GossipData::merge] requires, so this is the canonical state for exercising anti-entropy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetData {
    items: FxHashSet<u64>,
}

impl SetData {
    pub fn of(items: impl IntoIterator<Item = u64>) -> SetData {
        SetData {
            items: items.into_iter().collect(),
        }
    }

    pub fn try_deser(buf: &mut impl Buf) -> anyhow::Result<SetData> {
        let len = buf.try_get_usize_varint()?;
        let mut items = FxHashSet::default();
        for _ in 0..len {
            items.insert(buf.try_get_u64_varint()?);
        }
        Ok(SetData { items })
    }
}

impl GossipData for SetData {
    fn merge(&mut self, other: SetData) {
        self.items.extend(other.items);
    }

    fn encode(&self, buf: &mut BytesMut) {
        // sorted so that equal sets have equal wire bytes
        let mut items = self.items.iter().copied().collect::<Vec<_>>();
        items.sort();

        buf.put_usize_varint(items.len());
        for item in items {
            buf.put_u64_varint(item);
        }
    }
}


/// A [Gossiper] over [SetData] that records everything delivered to it. `on_gossip` returns
///  exactly the elements it had not seen before, so re-gossip carries deltas only.
#[derive(Clone)]
pub struct SetGossiper {
    inner: Arc<SetGossiperInner>,
}

struct SetGossiperInner {
    state: Mutex<FxHashSet<u64>>,
    unicasts: Mutex<Vec<(PeerName, Bytes)>>,
    broadcasts: Mutex<Vec<Bytes>>,
    reject_broadcasts: AtomicBool,
}

impl SetGossiper {
    pub fn new(initial: impl IntoIterator<Item = u64>) -> SetGossiper {
        SetGossiper {
            inner: Arc::new(SetGossiperInner {
                state: Mutex::new(initial.into_iter().collect()),
                unicasts: Default::default(),
                broadcasts: Default::default(),
                reject_broadcasts: AtomicBool::new(false),
            }),
        }
    }

    /// Makes `on_gossip_broadcast` fail from now on, the way an application rejects a
    ///  payload it cannot accept.
    pub fn reject_broadcasts(&self) {
        self.inner.reject_broadcasts.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> SetData {
        SetData {
            items: self.inner.state.lock().unwrap().clone(),
        }
    }

    pub fn received_unicasts(&self) -> Vec<(PeerName, Bytes)> {
        self.inner.unicasts.lock().unwrap().clone()
    }

    pub fn received_broadcasts(&self) -> Vec<Bytes> {
        self.inner.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Gossiper for SetGossiper {
    type Data = SetData;

    async fn on_gossip_unicast(&self, src: PeerName, payload: Bytes) -> anyhow::Result<()> {
        self.inner.unicasts.lock().unwrap().push((src, payload));
        Ok(())
    }

    async fn on_gossip_broadcast(&self, payload: Bytes) -> anyhow::Result<()> {
        if self.inner.reject_broadcasts.load(Ordering::SeqCst) {
            return Err(anyhow!("payload rejected by application"));
        }
        self.inner.broadcasts.lock().unwrap().push(payload);
        Ok(())
    }

    async fn gossip(&self) -> SetData {
        self.state()
    }

    async fn on_gossip(&self, mut payload: Bytes) -> anyhow::Result<Option<SetData>> {
        let incoming = SetData::try_deser(&mut payload)?;

        let mut state = self.inner.state.lock().unwrap();
        let delta = incoming
            .items
            .into_iter()
            .filter(|item| !state.contains(item))
            .collect::<FxHashSet<_>>();
        if delta.is_empty() {
            return Ok(None);
        }

        state.extend(delta.iter().copied());
        Ok(Some(SetData { items: delta }))
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use super::*;

    fn merged(mut a: SetData, b: SetData) -> SetData {
        a.merge(b);
        a
    }

    #[rstest]
    #[case::disjoint(SetData::of([1]), SetData::of([2]), SetData::of([3]))]
    #[case::overlapping(SetData::of([1, 2]), SetData::of([2, 3]), SetData::of([3, 4]))]
    #[case::empty(SetData::of([]), SetData::of([]), SetData::of([1]))]
    fn test_merge_is_associative(#[case] a: SetData, #[case] b: SetData, #[case] c: SetData) {
        assert_eq!(
            merged(a.clone(), merged(b.clone(), c.clone())),
            merged(merged(a, b), c)
        );
    }

    #[rstest]
    #[case::empty(SetData::of([]))]
    #[case::some(SetData::of([1, 2, 3]))]
    fn test_merge_is_idempotent(#[case] a: SetData) {
        assert_eq!(merged(a.clone(), a.clone()), a);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = SetData::of([1, 2]);
        let b = SetData::of([2, 5]);
        assert_eq!(merged(a.clone(), b.clone()), merged(b, a));
    }

    #[test]
    fn test_encode_deser_round_trip() {
        let data = SetData::of([3, 1, u64::MAX]);

        let mut buf = BytesMut::new();
        data.encode(&mut buf);

        assert_eq!(SetData::try_deser(&mut buf.freeze()).unwrap(), data);
    }

    #[tokio::test]
    async fn test_on_gossip_returns_only_the_delta() {
        let gossiper = SetGossiper::new([1, 2]);

        let mut buf = BytesMut::new();
        SetData::of([2, 3, 4]).encode(&mut buf);
        let delta = gossiper.on_gossip(buf.freeze()).await.unwrap();

        assert_eq!(delta, Some(SetData::of([3, 4])));
        assert_eq!(gossiper.state(), SetData::of([1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_on_gossip_with_nothing_new_returns_none() {
        let gossiper = SetGossiper::new([1, 2, 3]);

        let mut buf = BytesMut::new();
        SetData::of([1, 3]).encode(&mut buf);
        let delta = gossiper.on_gossip(buf.freeze()).await.unwrap();

        assert_eq!(delta, None);
        assert_eq!(gossiper.state(), SetData::of([1, 2, 3]));
    }
}
