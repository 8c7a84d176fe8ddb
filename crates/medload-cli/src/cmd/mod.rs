pub mod analyze;
pub mod load;
pub mod mesh;
