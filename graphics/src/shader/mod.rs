//! Shader pass graphs.
//!
//! A shader is an ordered list of blocks, each an ordered list of passes.
//! Definitions are data ([`ShaderDefinition`]); [`ShaderPassGraph`] is the
//! compiled, iterable form.

mod definition;
mod graph;
mod pass;

pub use definition::{BlockDefinition, PassDefinition, ResourceDefinition, ShaderDefinition};
pub use graph::{BlockCursor, BlockRef, PassCursor, PassRef, ShaderBlock, ShaderPassGraph};
pub use pass::{Binding, Mode, PassId, PassMode, PassOutput, ShaderPass};
