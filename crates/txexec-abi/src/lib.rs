//! Word-ABI glue shared by the precompiled-contract catalogue: selector
//! extraction, `int256` error-code encoding, and the CRUD condition grammar.
//! `txexec-precompiled` pairs this with its own hand-rolled ABI-word
//! reader/writer for argument decoding, rather than a `sol!`-macro-generated
//! codec, since none of the catalogue's methods share a single fixed
//! interface worth generating.

mod condition;
mod error_code;
mod selector;

pub use condition::{Condition, ConditionError, Op};
pub use error_code::encode_error_code;
pub use selector::{selector_of, split_selector};
