pub mod audio;
pub mod compute;
pub mod display;
pub mod entities;
pub mod story;
