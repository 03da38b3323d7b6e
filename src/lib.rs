//! noteterm library: the session core, storage gateway, terminal UI and
//! connection supervisor. The binary in `main.rs` wires them together.

pub mod core;
pub mod server;
pub mod store;
pub mod tui;

#[cfg(test)]
pub mod test_support;
