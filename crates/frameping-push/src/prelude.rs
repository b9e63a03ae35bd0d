pub use frameping_core::prelude::*;

// vim: ts=4
