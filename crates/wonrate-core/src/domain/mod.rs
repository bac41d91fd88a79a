mod currency;
mod date;
mod record;

pub use currency::Currency;
pub use date::RateDate;
pub use record::{RateKind, RateRecord};
