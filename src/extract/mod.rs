pub mod detail;
pub mod listing;

pub use detail::DetailParser;
pub use listing::ListingParser;
