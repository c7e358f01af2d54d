pub mod error;

// Localisation file model
pub mod loc;
