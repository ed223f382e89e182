pub mod build;
pub mod catalog;
pub mod cin7_config;
pub mod error;
pub mod generate;
pub mod io;
pub mod lighthouse;
pub mod migrate;
pub mod package_json;
pub mod package_manager;
pub mod paths;
pub mod process;
pub mod scaffold;
pub mod templates;

pub use error::{Cin7Error, Result};
