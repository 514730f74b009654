pub mod error;
pub mod consts;
pub mod buffer;
pub mod io;
pub mod progress;
pub mod sky;
pub mod resample;
pub mod registration;
pub mod stack;
pub mod deconv;
