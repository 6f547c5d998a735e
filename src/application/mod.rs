//! Application layer orchestrating the domain rules over the store ports.
//!
//! `ReservationService` owns space status transitions and queries.
//! `PaymentService` runs the payment pipeline on top of the
//! `TransactionLedger`, which is the single write path for transactions.

pub mod ledger;
pub mod payments;
pub mod reservations;
