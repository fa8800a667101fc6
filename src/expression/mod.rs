//! Arithmetic angle expressions (`"pi/30"`, `"2*pi/3"`, `"deg(6)"`).

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;

pub use error::ExprError;
pub use eval::eval_angle;
