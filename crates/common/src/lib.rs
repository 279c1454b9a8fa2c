//! Reusable utilities for the binaries and services around the bridge, such as initializing the
//! tracing framework.

pub mod logging;
