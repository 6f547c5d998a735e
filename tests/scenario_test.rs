use chrono::{DateTime, TimeZone, Utc};
use parkpay::application::ledger::TransactionLedger;
use parkpay::application::payments::PaymentService;
use parkpay::application::reservations::ReservationService;
use parkpay::config::PaymentConfig;
use parkpay::domain::payment::PaymentRequest;
use parkpay::domain::ports::Clock;
use parkpay::domain::space::{NewSpace, SpaceFilter};
use parkpay::domain::transaction::PaymentStatus;
use parkpay::error::ParkingError;
use parkpay::infrastructure::in_memory::{InMemorySpaceStore, InMemoryTransactionStore};
use rust_decimal_macros::dec;
use std::sync::Arc;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn payment_service(config: PaymentConfig) -> PaymentService {
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap());
    let ledger = TransactionLedger::new(Box::new(InMemoryTransactionStore::new()), config)
        .with_clock(Arc::new(clock));
    PaymentService::new(ledger)
}

fn payment_for(reference_id: u64) -> PaymentRequest {
    PaymentRequest {
        reference_id,
        amount: dec!(300.00),
        card_holder_name: "Nimal Perera".to_string(),
        card_number: "4111111111111111".to_string(),
        // Next month relative to the fixed clock
        expiry_date: "11/26".to_string(),
        cvv: "123".to_string(),
        payment_method: None,
    }
}

#[tokio::test]
async fn test_reserve_pay_release() {
    let reservations = ReservationService::new(Box::new(InMemorySpaceStore::new()));
    let payments = payment_service(PaymentConfig::default());

    let space = reservations
        .register(NewSpace::new("Galle Road", "A", "Compact"))
        .await
        .unwrap();
    reservations
        .register(NewSpace::new("Kandy Road", "B", "EV"))
        .await
        .unwrap();

    let reserved = reservations.reserve(space.id).await.unwrap();
    assert!(!reserved.is_available());
    assert!(reservations.available_in_zone("A").await.unwrap().is_empty());

    let tx = payments.process_payment(payment_for(space.id)).await.unwrap();
    assert_eq!(tx.status(), PaymentStatus::Success);

    let receipt = payments.receipt(tx.transaction_id).await.unwrap();
    assert_eq!(receipt.amount, dec!(300.00));
    assert_eq!(receipt.paid_for, format!("Parking Fee for Booking #{}", space.id));
    assert_eq!(receipt.merchant_info, "Smart Parking Management System");

    let found = payments
        .find_by_receipt(&receipt.receipt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.transaction_id, tx.transaction_id);

    let released = reservations.release(space.id).await.unwrap();
    assert!(released.is_available());
    assert!(matches!(
        reservations.release(space.id).await,
        Err(ParkingError::AlreadyAvailable(_))
    ));

    let filter = SpaceFilter {
        available: Some(true),
        ..Default::default()
    };
    assert_eq!(reservations.filter(&filter).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_declined_payment_keeps_history_without_receipt() {
    let config = PaymentConfig {
        merchant_info: "Colombo City Parking".to_string(),
        ..Default::default()
    };
    let payments = payment_service(config);

    let mut declined = payment_for(9);
    declined.cvv = "000".to_string();
    let failed = payments.process_payment(declined).await.unwrap();
    assert_eq!(failed.status(), PaymentStatus::Failed);
    assert!(matches!(
        payments.receipt(failed.transaction_id).await,
        Err(ParkingError::ReceiptUnavailable { .. })
    ));

    let retried = payments.process_payment(payment_for(9)).await.unwrap();
    let receipt = payments.receipt(retried.transaction_id).await.unwrap();
    assert_eq!(receipt.merchant_info, "Colombo City Parking");

    let history = payments.list_by_reference(9).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(payments.list_by_status(PaymentStatus::Failed).await.unwrap().len(), 1);
}
