pub mod content;
pub mod frame;
pub mod script;
