//! Commands: a single pass and the loop that repeats it

pub mod driver;
pub mod sync;

pub use driver::{run_loop, shutdown_signal, DriverStats};
pub use sync::run_pass;
