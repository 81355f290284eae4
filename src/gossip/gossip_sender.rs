use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::gossip::GossipData;


enum Slot<D> {
    Empty,
    Pending(D),
    Closed,
}

struct SendCell<D> {
    slot: Mutex<Slot<D>>,
    wakeup: Notify,
}

/// Accumulates [GossipData] bound for one destination connection and transmits it when the
///  connection is free.
///
/// The cell is a single slot, not a queue: while the worker is busy transmitting, every
///  further [GossipSender::send] merges into the one pending datum. That bounds the
///  outstanding work per destination to a single payload no matter how fast updates arrive,
///  and a slow connection simply receives fewer, fatter frames.
pub struct GossipSender<D> {
    cell: Arc<SendCell<D>>,
}

impl<D: GossipData> GossipSender<D> {
    /// Creates the sender and spawns its worker task. `send_fn` encodes one datum and hands
    ///  the frame to the connection; it runs on the worker only, one invocation at a time.
    pub fn start<F, Fut>(send_fn: F) -> GossipSender<D>
    where
        F: Fn(D) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cell = Arc::new(SendCell {
            slot: Mutex::new(Slot::Empty),
            wakeup: Notify::new(),
        });

        let worker_cell = cell.clone();
        tokio::spawn(async move {
            loop {
                let pending = {
                    let mut slot = worker_cell.slot.lock().unwrap();
                    match std::mem::replace(&mut *slot, Slot::Empty) {
                        Slot::Pending(data) => Some(data),
                        Slot::Empty => None,
                        Slot::Closed => {
                            *slot = Slot::Closed;
                            break;
                        }
                    }
                };

                match pending {
                    Some(data) => send_fn(data).await,
                    // Notify stores a permit if the sender fired before we got here, so a
                    //  datum placed between the check above and this await is not missed
                    None => worker_cell.wakeup.notified().await,
                }
            }
        });

        GossipSender { cell }
    }

    /// Enqueues `data`, merging it into whatever is already pending. Never blocks.
    ///
    /// NB: callers must serialize `send` per sender - the owning channel's mutex does this.
    pub fn send(&self, data: D) {
        let mut slot = self.cell.slot.lock().unwrap();
        match &mut *slot {
            Slot::Pending(pending) => pending.merge(data),
            Slot::Empty => {
                *slot = Slot::Pending(data);
                self.cell.wakeup.notify_one();
            }
            Slot::Closed => {}
        }
    }

    /// Shuts the worker down. A datum still pending is dropped - the next anti-entropy round
    ///  re-converges whatever was lost.
    pub fn stop(&self) {
        *self.cell.slot.lock().unwrap() = Slot::Closed;
        self.cell.wakeup.notify_one();
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::test_util::gossiper::SetData;
    use super::*;

    fn recording_sender(stall: Duration) -> (GossipSender<SetData>, Arc<Mutex<Vec<SetData>>>) {
        let sent: Arc<Mutex<Vec<SetData>>> = Default::default();
        let sent_by_worker = sent.clone();
        let sender = GossipSender::start(move |data: SetData| {
            let sent = sent_by_worker.clone();
            async move {
                if !stall.is_zero() {
                    sleep(stall).await;
                }
                sent.lock().unwrap().push(data);
            }
        });
        (sender, sent)
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_delivers() {
        let (sender, sent) = recording_sender(Duration::ZERO);

        sender.send(SetData::of([1]));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(sent.lock().unwrap().as_slice(), &[SetData::of([1])]);
    }

    /// A burst against a stalled connection must coalesce into a single merged transmission:
    ///  one frame for the datum the worker had already taken, one frame for everything that
    ///  arrived while it was busy, never one frame per send.
    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_while_worker_busy() {
        let (sender, sent) = recording_sender(Duration::from_millis(100));

        sender.send(SetData::of([1]));
        // let the worker take the first datum and stall in its send
        sleep(Duration::from_millis(10)).await;

        sender.send(SetData::of([2]));
        sender.send(SetData::of([3]));
        sender.send(SetData::of([4]));

        sleep(Duration::from_millis(500)).await;

        assert_eq!(
            sent.lock().unwrap().as_slice(),
            &[SetData::of([1]), SetData::of([2, 3, 4])]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_stop_is_dropped() {
        let (sender, sent) = recording_sender(Duration::ZERO);

        sender.stop();
        sender.send(SetData::of([1]));
        sleep(Duration::from_millis(50)).await;

        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_drops_pending_datum() {
        let (sender, sent) = recording_sender(Duration::from_millis(100));

        sender.send(SetData::of([1]));
        sleep(Duration::from_millis(10)).await;

        // worker is busy with [1]; [2] is pending in the cell when the stop lands
        sender.send(SetData::of([2]));
        sender.stop();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(sent.lock().unwrap().as_slice(), &[SetData::of([1])]);
    }
}
