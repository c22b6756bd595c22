pub mod logging;
pub mod prompt;
pub mod rotation;
