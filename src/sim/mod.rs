pub mod close_buffer;
pub mod extender;
pub mod generator;

// Re-export the working set for convenient access (e.g. `use crate::sim::generate`).
pub use close_buffer::CloseBuffers;
pub use extender::step;
pub use generator::generate;
