//! Tools for handling stop signals (e.g. `SIGINT`). See [polling].
//!
//! Note that enabling the handlers in [polling] will disable the default
//! stop-signal handler (the process won't just die on `Ctrl+C` anymore).

pub mod polling;

const THREAD_EXPECT_MSG: &str = "The other thread shouldn't panic.";
