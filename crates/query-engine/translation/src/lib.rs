//! Translation of a natural-language question into a model prompt, and of the
//! model's answer back into a runnable statement.

pub mod translation;
