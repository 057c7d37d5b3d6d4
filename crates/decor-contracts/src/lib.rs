pub mod access;
pub mod catalog;
pub mod events;
pub mod prompts;
pub mod runs;
