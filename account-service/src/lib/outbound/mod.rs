pub mod media;
pub mod repositories;
