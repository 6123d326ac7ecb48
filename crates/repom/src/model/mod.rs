//! Model - Entity contract, convention flags and key values

pub mod core_trait;
pub mod flags;
pub mod primary_key;

pub use core_trait::Model;
pub use flags::{FlagOverrides, ModelFlags};
pub use primary_key::PrimaryKey;
