//! Library wrapper around the `blockcache` CLI implementation.
//!
//! The CLI is exercised through its binary (`src/main.rs`) and integration tests. Compiling the
//! binary crate root as a module here keeps `cargo test -p blockcache-cli --lib` a fast typecheck
//! of the CLI code without building the binary test suite.
//!
//! Note: `fn main()` inside `main.rs` is just another function when compiled as a module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
