mod mock;
mod open_banking;
mod scrape;
mod snapshot;

pub use mock::MockAdapter;
pub use open_banking::{OpenBankingAdapter, OpenBankingCredentials};
pub use scrape::ScrapeAdapter;
pub use snapshot::SnapshotAdapter;
