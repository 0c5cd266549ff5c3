//! Domain entities - the core business objects.

mod affinity;
mod recently_viewed;
mod session;

pub use affinity::{Affinity, AffinityId};
pub use recently_viewed::{MAX_RECENTLY_VIEWED, RecentlyViewedEntry, merge_lists, record_view};
pub use session::{Session, UserId};
