//! # laf
//!
//! A labeled argumentation framework engine: forward-chaining inference over
//! facts and rules whose truth is a vector of label values, with a
//! configurable per-dimension algebra for support, aggregation, and conflict.
//!
//! ## Architecture
//!
//! - **Knowledge** (`knowledge`): facts `name(argument)`, rules
//!   `head :- body...`, and the statement identity that drives merging
//! - **Algebra** (`algebra`): the operation table, numeric expression
//!   evaluation over `X`/`Y`, and the symbolic `Union`/`Intersection`
//!   fallbacks
//! - **Engine** (`engine`): fixed-point rule firing, duplicate aggregation
//!   with graph rebuilding, and conflict resolution
//! - **Graph** (`graph`): the derivation graph arena and its export with
//!   SUPPORT / AGGREGATION / CONFLICT edge classification
//! - **Program** (`program`): JSON/TOML program loading and validation
//!
//! ## Library usage
//!
//! ```no_run
//! use laf::program::Program;
//!
//! let text = std::fs::read_to_string("program.json").unwrap();
//! let program = Program::from_json_str(&text).unwrap();
//! let graph = program.build().unwrap();
//! println!("{}", serde_json::to_string_pretty(&graph).unwrap());
//! ```

pub mod algebra;
pub mod engine;
pub mod error;
pub mod graph;
pub mod knowledge;
pub mod program;

pub use error::{LafError, LafResult};
