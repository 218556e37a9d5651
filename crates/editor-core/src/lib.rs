mod changes;
mod config;
mod error;
mod history;
mod ops;
mod session;
mod spelling;

pub use crate::changes::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::history::*;
pub use crate::ops::*;
pub use crate::session::*;
pub use crate::spelling::*;
