mod error;
mod generator;
pub mod llm;
pub mod post;
pub mod prompt;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use generator::BlogGenerator;
