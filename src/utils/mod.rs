pub mod crypto;
pub mod field_mapper;
pub mod time;
pub mod token;
pub mod validation;
