//! Session validation adapters.

mod static_validator;

pub use static_validator::StaticSessionValidator;
