pub mod target;
pub mod role_map;
pub mod projection;

pub use projection::{quick_fill, ProjectionReport};
pub use target::FormDocument;
