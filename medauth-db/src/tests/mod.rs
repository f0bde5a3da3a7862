pub mod connection;
pub mod reconciler;
