pub mod conversion;
pub mod driver;
pub mod lane;
