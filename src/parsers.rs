pub mod lenient;
pub mod nom;
pub mod section_slicer;
