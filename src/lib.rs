//! Core of the Rusty Fluo viewer: loading tab-separated fluorescence
//! recordings, resampling traces onto a common timeline, aggregating them
//! and exporting rendered figures.

pub mod color;
pub mod data;
pub mod error;
pub mod export;
pub mod figure;
pub mod settings;
