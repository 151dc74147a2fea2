pub mod chunk;
pub mod inspect;
pub mod query;
pub mod status;
