pub mod align;
pub mod deconv;
pub mod info;
pub mod stack;
