pub mod diagnostic;
pub mod identity;
pub mod json;
pub mod merger;
pub mod terminal;
