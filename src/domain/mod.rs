//! Domain model: parking spaces and their reservation status, payment
//! requests and the pure rules that validate and decide them, and the
//! write-once transactions and receipts that record the result.

pub mod payment;
pub mod ports;
pub mod receipt;
pub mod space;
pub mod transaction;
