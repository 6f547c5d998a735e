use crate::domain::payment::PaymentRequest;
use crate::error::{ParkingError, Result};
use std::io::Read;

/// Reads payment requests from a CSV source.
///
/// Expected header: `reference, amount, holder, card, expiry, cvv, method`.
/// The `method` column may be empty or missing.
pub struct PaymentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentReader<R> {
    /// Creates a new `PaymentReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one request per row; a malformed row yields an
    /// `Err` without ending the stream.
    pub fn requests(self) -> impl Iterator<Item = Result<PaymentRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ParkingError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{AMOUNT_LIMIT, decide};
    use crate::domain::transaction::PaymentStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "reference, amount, holder, card, expiry, cvv, method\n\
                    1, 50.00, Nimal Perera, 4111111111111111, 12/99, 123, \n\
                    2, 12.5, Kamal Silva, 5555555555554444, 01/30, 000, MOBILE_PAY";
        let reader = PaymentReader::new(data.as_bytes());
        let results: Vec<Result<PaymentRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.reference_id, 1);
        assert_eq!(first.amount, dec!(50.00));
        assert_eq!(first.card_holder_name, "Nimal Perera");
        assert_eq!(first.payment_method, None);

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.cvv, "000");
        assert_eq!(second.payment_method.as_deref(), Some("MOBILE_PAY"));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "reference, amount, holder, card, expiry, cvv, method\n\
                    abc, 1.0, A, 4111111111111111, 12/99, 123, \n\
                    3, 1.0, B, 4111111111111111, 12/99, 123, ";
        let reader = PaymentReader::new(data.as_bytes());
        let results: Vec<Result<PaymentRequest>> = reader.requests().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_reader_keeps_amount_scale_and_precision() {
        let data = "reference, amount, holder, card, expiry, cvv, method\n\
                    1, 1.00, A, 4111111111111111, 12/99, 123, \n\
                    2, 10000.0000000000001, B, 4111111111111111, 12/99, 123, ";
        let requests: Vec<PaymentRequest> = PaymentReader::new(data.as_bytes())
            .requests()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(requests[0].amount.to_string(), "1.00");
        assert_eq!(requests[1].amount.to_string(), "10000.0000000000001");
        assert!(requests[1].amount > AMOUNT_LIMIT);
        assert_eq!(decide(&requests[1]).status, PaymentStatus::Failed);
    }

    #[test]
    fn test_reader_rejects_non_numeric_amount() {
        let data = "reference, amount, holder, card, expiry, cvv, method\n\
                    1, 12.5.0, A, 4111111111111111, 12/99, 123, \n\
                    2, ten, A, 4111111111111111, 12/99, 123, ";
        let results: Vec<Result<PaymentRequest>> =
            PaymentReader::new(data.as_bytes()).requests().collect();

        assert!(results.iter().all(|r| r.is_err()));
    }
}
