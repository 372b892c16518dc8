pub mod alert;
pub mod calculation;
pub mod file_formats;
pub mod metal;
pub mod project;
pub mod sample;
pub mod standard;
