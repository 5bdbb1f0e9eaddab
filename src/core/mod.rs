pub mod aggregate;
pub mod assemble;
pub mod bounds;
pub mod engine;
pub mod ids;
pub mod naming;
pub mod pipeline;
pub mod projection;
pub mod schema;
pub mod workspace;

pub use crate::domain::model::{AssembledDeck, RunReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
