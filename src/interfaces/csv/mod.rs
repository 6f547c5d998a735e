//! CSV adapters used by the `parkpay` binary: readers for space inventories
//! and payment batches, writers for spaces and recorded transactions.

pub mod payment_reader;
pub mod space_reader;
pub mod space_writer;
pub mod transaction_writer;
