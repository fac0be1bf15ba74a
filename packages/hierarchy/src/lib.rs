//! ControlMap hierarchy - infer control hierarchies of compliance frameworks.
//!
//! Frameworks arrive as flat lists of reference codes (`AC-16(1)`,
//! `GV.RM-01`, `164.306(d)(3)(ii)(B)`). This crate reconstructs the implied
//! parent/child forest from the codes alone, synthesizes missing group
//! nodes, and assigns hierarchy levels and a depth-first display order.
//!
//! # Example
//!
//! ```
//! use controlmap_hierarchy::engine::HierarchyEngine;
//! use controlmap_hierarchy::registry::create_default_registry;
//! use controlmap_hierarchy::store::{MemoryStore, NodeStore};
//!
//! let registry = create_default_registry();
//! let spec = registry.find("NIST-CSF", "2.0").unwrap();
//!
//! let mut store = MemoryStore::new();
//! let framework = store
//!     .seed_framework("NIST-CSF", "2.0", ["GV.RM-02", "GV.RM-01"])
//!     .unwrap();
//!
//! let plan = HierarchyEngine::new(spec)
//!     .plan(&store.load_framework(&framework).unwrap())
//!     .unwrap();
//! let order: Vec<&str> = plan.targets.iter().map(|a| a.ref_code.as_str()).collect();
//! assert_eq!(order, vec!["GV", "GV.RM", "GV.RM-01", "GV.RM-02"]);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`types`]: Core data types (Node, FrameworkSnapshot, plan entries)
//! - [`error`]: Error types and Result alias
//! - [`natural`]: Numeric-aware sort key
//! - [`rules`]: Parent inference rules per reference-code family
//! - [`ancestry`]: Ancestor chain resolution
//! - [`synth`]: Group synthesis for missing ancestors
//! - [`order`]: Display-order sequencing
//! - [`report`]: Warnings and per-framework reports
//! - [`engine`]: Hierarchy assignment engine
//! - [`registry`]: Framework registry
//! - [`store`]: Persistence seam and in-memory store
//! - [`yaml`]: YAML store file
//! - [`runner`]: Multi-framework runs
//! - [`crosswalk`]: SCF mapping cells
//! - [`cli`]: Command-line interface

pub mod ancestry;
pub mod cli;
pub mod config;
pub mod crosswalk;
pub mod engine;
pub mod error;
pub mod natural;
pub mod order;
pub mod registry;
pub mod report;
pub mod rules;
pub mod runner;
pub mod store;
pub mod synth;
pub mod types;
pub mod yaml;

// Re-export commonly used items
pub use engine::{HierarchyEngine, HierarchyPlan};
pub use error::{ChainError, HierarchyError, Result};
pub use registry::{create_default_registry, FrameworkRegistry, FrameworkSpec};
pub use rules::RuleFamily;
pub use runner::{process_all, process_framework, ImportSummary};
pub use store::{MemoryStore, NodeStore};
pub use types::{FrameworkId, Node, NodeId};
