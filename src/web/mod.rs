pub mod handlers;
pub mod session_store;
