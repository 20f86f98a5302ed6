//! Development server proxy: forwards requests under a path prefix to a fixed
//! upstream origin, stripping the prefix.

pub use {forward::*, rule::*, server::*};

mod forward;
mod rule;
mod server;
