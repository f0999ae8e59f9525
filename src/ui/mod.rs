pub mod files;
pub mod panels;
pub mod plot;
