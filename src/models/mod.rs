pub mod health;
pub mod log_entry;
pub mod process_info;
pub mod project;
pub mod system;
pub mod vpn_status;

pub use health::*;
pub use log_entry::*;
pub use process_info::*;
pub use project::*;
pub use system::*;
pub use vpn_status::*;
