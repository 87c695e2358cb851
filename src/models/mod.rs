pub mod filter;
pub mod job;
pub mod site;
