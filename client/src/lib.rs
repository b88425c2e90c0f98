pub mod aggregate;
pub mod config;
pub mod error;
pub mod generation;
pub mod http_source;
pub mod selection;
pub mod session;
pub mod source;
pub mod tracker;

#[cfg(test)]
mod test_support;
