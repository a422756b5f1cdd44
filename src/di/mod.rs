pub mod container;

pub use container::{Repositories, ServiceContainer};
