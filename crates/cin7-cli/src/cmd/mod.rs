pub mod add;
pub mod analyze;
pub mod build;
pub mod create;
pub mod dev;
pub mod generate;
pub mod migrate;
