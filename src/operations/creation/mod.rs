mod make_box;
mod make_polyhedron;
mod make_prism;

pub use make_box::MakeBox;
pub use make_polyhedron::MakePolyhedron;
pub use make_prism::MakePrism;
