pub mod assembler;
pub mod call_graph;
pub mod models;

pub use assembler::IndexAssembler;
pub use call_graph::{call_target_universe, CallGraph};
pub use models::*;
