pub mod interview;
pub mod resume;
