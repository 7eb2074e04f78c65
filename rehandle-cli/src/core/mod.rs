pub mod output;
pub mod reporter;
