pub mod entry;
pub mod month;
pub mod settings;
pub mod stats;
pub mod weight;
