// ── Device attribute cache ──
//
// One attribute map per registered module, replaced wholesale by the
// refresh pass and read by the controller facade.

mod cache;
pub(crate) mod refresh;

pub use cache::{CacheStore, Cached};
pub use refresh::RefreshState;
