pub mod api;
pub mod candidate;
pub mod secret;
pub mod session;
pub mod tally;
