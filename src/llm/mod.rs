pub mod client;
pub mod commentary;
pub mod mock;
pub mod prompts;

pub use client::*;
pub use commentary::*;
pub use mock::*;
pub use prompts::*;
