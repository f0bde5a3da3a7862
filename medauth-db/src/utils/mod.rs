pub mod logging;
pub mod mongo_uri;
