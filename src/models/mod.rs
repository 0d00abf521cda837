// Stream payload models

mod container;

pub use container::{ContainerSnapshot, NAME_SEPARATOR};
