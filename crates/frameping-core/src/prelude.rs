pub use crate::app::App;
pub use frameping_types::error::{ClResult, Error};
pub use frameping_types::lock;
pub use frameping_types::types::{Fid, Timestamp};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
