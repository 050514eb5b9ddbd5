pub mod event;
pub mod input_buffer;
pub mod scheduler;
pub mod step;
pub mod world;
