//! Change-feed channel.

use crate::error::StoreError;
use couchconf_protocol::ChangeRecord;
use tokio::sync::mpsc;

/// Capacity of the channel between a store and its feed consumer.
pub const FEED_BUFFER: usize = 64;

/// One item delivered on a change feed.
#[derive(Debug)]
pub enum FeedRecord {
    /// A document changed.
    Change(ChangeRecord),
    /// The feed failed.
    Error(StoreError),
}

/// Sending half of a change feed, held by the store.
pub type FeedSender = mpsc::Sender<FeedRecord>;

/// Receiving half of a change feed.
///
/// Dropping the stream stops delivery: the store notices the closed channel
/// on its next send and stops producing.
#[derive(Debug)]
pub struct ChangeStream {
    receiver: mpsc::Receiver<FeedRecord>,
}

impl ChangeStream {
    /// Creates a connected sender/stream pair.
    pub fn channel() -> (FeedSender, Self) {
        let (sender, receiver) = mpsc::channel(FEED_BUFFER);
        (sender, Self { receiver })
    }

    /// Waits for the next record.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn next(&mut self) -> Option<FeedRecord> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order_then_ends() {
        let (sender, mut stream) = ChangeStream::channel();

        sender
            .send(FeedRecord::Change(ChangeRecord {
                id: "a".into(),
                ..Default::default()
            }))
            .await
            .unwrap();
        sender
            .send(FeedRecord::Error(StoreError::FeedClosed))
            .await
            .unwrap();
        drop(sender);

        assert!(matches!(stream.next().await, Some(FeedRecord::Change(r)) if r.id == "a"));
        assert!(matches!(
            stream.next().await,
            Some(FeedRecord::Error(StoreError::FeedClosed))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_stream_closes_sender() {
        let (sender, stream) = ChangeStream::channel();
        drop(stream);
        assert!(sender.is_closed());
    }
}
