mod entry;
mod feed;
mod subscription;
mod unread;

pub use entry::{CombinedEntry, EntryStore};
pub use feed::FeedStore;
pub use subscription::SubscriptionStore;
pub use unread::UnreadStore;

/// The four reactive stores hydration writes into, bundled so they can be
/// shared as one `Arc` between the hydrator and the rest of the app.
#[derive(Default)]
pub struct Stores {
    pub feeds: FeedStore,
    pub subscriptions: SubscriptionStore,
    pub unread: UnreadStore,
    pub entries: EntryStore,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }
}
