pub mod histories;
pub mod resume;
pub mod upload;
