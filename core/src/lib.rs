pub mod harness;
pub mod manifest;
pub mod matrix;
pub mod report;
pub mod results;
pub mod settings;
