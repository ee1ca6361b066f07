//! In-memory storage: memory accounting and a reader over in-memory series.

mod eval;
mod manager;
mod reader;

pub use eval::{PointEvaluator, PointRow};
pub use manager::{MemoryBudget, MemoryManager, TableReservation, UnboundedMemory, memory_manager};
pub use reader::{MemoryReader, Series};
