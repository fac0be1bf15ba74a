//! Framework registry: which rule family applies to which framework.
//!
//! Rule families are selected through an explicit table keyed by framework
//! code and version, never by sniffing reference codes at runtime. The
//! built-in table can be replaced or extended from a YAML file.

mod config;
mod core;
mod spec;

pub use config::create_default_registry;
pub use core::{load_registry, FrameworkRegistry};
pub use spec::FrameworkSpec;
