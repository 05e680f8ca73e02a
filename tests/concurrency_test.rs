use paygate::domain::checkout::CheckoutData;
use paygate::domain::payment::PaymentStatus;
use paygate::domain::ports::PaymentStore;
use paygate::error::PaymentError;
use rust_decimal_macros::dec;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_complete_and_cancel_race_has_one_winner() {
    let registry = common::registry();
    let store = common::store();

    for _ in 0..50 {
        let id = common::controller(&registry, "paypal", &store)
            .process_payment(CheckoutData::new(dec!(1.00)))
            .await
            .unwrap()
            .payment
            .id;

        let completer = common::controller(&registry, "paypal", &store);
        let canceller = common::controller(&registry, "paypal", &store);
        let complete = tokio::spawn(async move { completer.complete(&common::callback_for(id)).await });
        let cancel = tokio::spawn(async move { canceller.cancel(&common::callback_for(id)).await });

        let complete = complete.await.unwrap();
        let cancel = cancel.await.unwrap();
        let stored = store.load(id).await.unwrap().unwrap();

        match (complete, cancel) {
            (Ok(done), Err(err)) => {
                assert_eq!(done.status(), PaymentStatus::Success);
                assert_eq!(stored.status(), PaymentStatus::Success);
                assert!(matches!(
                    err,
                    PaymentError::ConcurrentUpdateConflict { .. } | PaymentError::InvalidTransition { .. }
                ));
            }
            (Err(err), Ok(reverted)) => {
                assert_eq!(reverted.status(), PaymentStatus::Incomplete);
                assert_eq!(stored.status(), PaymentStatus::Incomplete);
                assert!(matches!(
                    err,
                    PaymentError::ConcurrentUpdateConflict { .. } | PaymentError::InvalidTransition { .. }
                ));
            }
            (complete, cancel) => panic!("expected exactly one winner, got {complete:?} / {cancel:?}"),
        }
    }
}

#[tokio::test]
async fn test_stale_writer_is_rejected() {
    let registry = common::registry();
    let store = common::store();
    let controller = common::controller(&registry, "paypal", &store);

    let payment = controller
        .process_payment(CheckoutData::new(dec!(2.00)))
        .await
        .unwrap()
        .payment;

    // A writer holding the Pending snapshot after someone else completed it.
    let mut stale = payment.clone();
    controller.complete(&common::callback_for(payment.id)).await.unwrap();
    stale.transition(PaymentStatus::Incomplete).unwrap();

    let result = store.save(&stale, PaymentStatus::Pending).await;
    assert!(matches!(
        result,
        Err(PaymentError::ConcurrentUpdateConflict {
            expected: PaymentStatus::Pending,
            found: PaymentStatus::Success,
            ..
        })
    ));
    let stored = store.load(payment.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), PaymentStatus::Success);
}
