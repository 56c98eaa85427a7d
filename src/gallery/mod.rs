pub mod batch;
pub mod collection;
pub mod image;
