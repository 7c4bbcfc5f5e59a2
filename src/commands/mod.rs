pub mod deploy;
pub mod health;
pub mod logs;
pub mod overview;
pub mod process;
pub mod project;
pub mod service;
pub mod vpn;

pub use deploy::*;
pub use health::*;
pub use logs::*;
pub use overview::*;
pub use process::*;
pub use project::*;
pub use service::*;
pub use vpn::*;
