pub mod identifier;
pub mod process_killer;
pub mod shell;

pub use identifier::*;
pub use process_killer::*;
pub use shell::*;
