//! Storage boundary for Tidal.
//!
//! Planning talks to storage through three narrow traits:
//! [`MetaClient`] resolves databases and retention policies, [`Authorizer`]
//! checks read privileges, and [`Reader`] streams the [`Table`]s of one time
//! window. [`memory`] provides in-memory implementations along with the
//! memory accounting every read goes through.

pub mod auth;
pub mod memory;
pub mod meta;
pub mod read_spec;
pub mod reader;
pub mod stream;
pub mod table;

pub use auth::{Authorizer, Privilege, StaticAuthorizer, User};
pub use memory::{
    MemoryBudget, MemoryManager, MemoryReader, Series, TableReservation, UnboundedMemory,
    memory_manager,
};
pub use meta::{DatabaseInfo, MemoryMetaClient, MetaClient, RetentionPolicyInfo};
pub use read_spec::{GroupMode, ReadSpec};
pub use reader::Reader;
pub use stream::{TableStream, iter_stream};
pub use table::{GroupKey, Table};
