pub mod callgraph;
pub mod inventory;
pub mod pipeline;
pub mod signature;
