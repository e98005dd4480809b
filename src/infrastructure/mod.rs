//! Infrastructure concerns shared by the library and the sweep driver

pub mod log_messages;
