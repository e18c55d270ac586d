//! Small threading building blocks shared by the rest of the workspace:
//! channels, cancellation, self-joining threads, and stop-signal handling.

pub mod cancel;
pub mod channels;
pub mod drop_join_thread;
pub mod stop_signals;
