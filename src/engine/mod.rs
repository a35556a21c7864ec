pub mod arbitrage;
pub mod kelly;
pub mod matcher;
pub mod odds;
pub mod validation;

pub use arbitrage::ArbitrageResult;
pub use matcher::{TeamMatcher, TokenOverlapMatcher};
pub use odds::OddsQuote;
