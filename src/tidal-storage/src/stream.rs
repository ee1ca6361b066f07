//! Table stream utilities.

use std::pin::Pin;

use futures::stream::Stream;

use common_error::TidalResult;

use crate::table::Table;

/// Tables of one window, in the order the reader produces them.
pub type TableStream = Pin<Box<dyn Stream<Item = TidalResult<Table>> + Send>>;

/// Create a `TableStream` from a fallible iterator.
pub fn iter_stream<I>(iter: I) -> TableStream
where
    I: IntoIterator<Item = TidalResult<Table>> + Send + 'static,
    I::IntoIter: Send,
{
    Box::pin(futures::stream::iter(iter))
}
