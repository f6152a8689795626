mod clock;
mod key;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{generate_key, item_key};
pub use store::{CacheStats, CacheStore};
pub use types::{CacheEntry, CacheEntryInfo};
