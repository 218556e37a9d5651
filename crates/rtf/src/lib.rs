mod codepage;
mod error;
mod lexer;
mod model;
mod parser;
mod style_tags;
mod value;
mod writer;

pub use crate::error::*;
pub use crate::model::*;
pub use crate::parser::*;
pub use crate::style_tags::*;
pub use crate::value::*;
pub use crate::writer::*;
