pub mod fields;
pub mod parse;
