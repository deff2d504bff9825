//! Route compilation: literals, structs, route assembly and import resolution

pub mod literal;
pub mod resolver;
pub mod route_assembler;
pub mod struct_decoder;
pub mod walker;

pub use resolver::{ResolveStats, SourceGraph, VisitedSet};
pub use route_assembler::{assemble_route, RouteProperties};
