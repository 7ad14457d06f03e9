//! # Re-entrant Recipient Attacks
//!
//! A malicious recipient runs code while value is being delivered to it and
//! tries to call back into the marketplace before the outer operation
//! returns: a second `return_stake`, a `select_report` on another request, or
//! a fresh submission.
//!
//! ## Expected Defense
//!
//! The nested call finds an operation in flight and fails with
//! `ReentrantCall`. Whatever the hook does, the recipient is paid at most once.
//! Views read from inside the delivery already show the outcome of the
//! operation paying out.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use futures::executor::block_on;
    use parking_lot::Mutex;
    use rb_01_value_custody::ReceiveHook;
    use rb_03_request_ledger::RequestStatus;
    use rb_04_report_ledger::NewReport;
    use rb_05_marketplace::{MarketError, MarketResult, MarketplaceApi};
    use shared_types::{units, Amount, CallContext, ErrorKind, ReportId, RequestId};
    use std::sync::{Arc, OnceLock, Weak};

    /// What the hook tries when it receives value.
    #[derive(Clone, Copy)]
    enum Attack {
        ReturnStakeAgain(ReportId),
        SelectOther { request: RequestId, report: ReportId },
        SubmitReport(RequestId),
    }

    struct ReenteringRecipient {
        market: OnceLock<Weak<Market>>,
        attack: Attack,
        /// Reject receipt when the nested call fails.
        propagate: bool,
        outcomes: Mutex<Vec<MarketResult<Amount>>>,
    }

    impl ReenteringRecipient {
        fn new(attack: Attack, propagate: bool) -> Arc<Self> {
            Arc::new(Self {
                market: OnceLock::new(),
                attack,
                propagate,
                outcomes: Mutex::new(Vec::new()),
            })
        }

        fn arm(self: &Arc<Self>, t: &TestMarket, who: shared_types::Address) {
            let _ = self.market.set(Arc::downgrade(&t.market));
            t.wallets.set_hook(who, self.clone());
        }

        fn outcomes(&self) -> Vec<MarketResult<Amount>> {
            self.outcomes.lock().clone()
        }
    }

    impl ReceiveHook for ReenteringRecipient {
        fn on_receive(&self, _amount: Amount) -> Result<(), String> {
            let Some(market) = self.market.get().and_then(Weak::upgrade) else {
                return Ok(());
            };
            let outcome = match self.attack {
                Attack::ReturnStakeAgain(report) => block_on(market.return_stake(BOB, report)),
                Attack::SelectOther { request, report } => {
                    block_on(market.select_report(BOB, request, report, 10_000))
                        .map(|o| o.selection.payout())
                }
                Attack::SubmitReport(request) => block_on(market.submit_report(
                    CallContext::from_caller(BOB).with_value(units(1, 100)),
                    NewReport::new(request, "nested", [0; 32]),
                ))
                .map(|_| 0),
            };
            let failed = outcome.is_err();
            self.outcomes.lock().push(outcome);
            if failed && self.propagate {
                return Err("nested call failed".to_string());
            }
            Ok(())
        }
    }

    /// What a recipient sees through the views while being paid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Observed {
        status: Option<RequestStatus>,
        stake: Option<Amount>,
        fees: Amount,
    }

    struct ObservingRecipient {
        market: OnceLock<Weak<Market>>,
        request: RequestId,
        report: ReportId,
        seen: Mutex<Vec<Observed>>,
    }

    impl ObservingRecipient {
        fn arm(
            t: &TestMarket,
            who: shared_types::Address,
            request: RequestId,
            report: ReportId,
        ) -> Arc<Self> {
            let hook = Arc::new(Self {
                market: OnceLock::new(),
                request,
                report,
                seen: Mutex::new(Vec::new()),
            });
            let _ = hook.market.set(Arc::downgrade(&t.market));
            t.wallets.set_hook(who, hook.clone());
            hook
        }

        fn seen(&self) -> Vec<Observed> {
            self.seen.lock().clone()
        }
    }

    impl ReceiveHook for ObservingRecipient {
        fn on_receive(&self, _amount: Amount) -> Result<(), String> {
            if let Some(market) = self.market.get().and_then(Weak::upgrade) {
                self.seen.lock().push(Observed {
                    status: market.request(self.request).map(|r| r.status),
                    stake: market.report(self.report).map(|r| r.stake),
                    fees: market.accumulated_fees(),
                });
            }
            Ok(())
        }
    }

    /// Request with ALICE winning and BOB losing; returns BOB's report.
    async fn completed_with_loser(t: &TestMarket) -> ReportId {
        let request_id = t.open_request(REQUESTER).await;
        let winner = t.submit(ALICE, request_id).await;
        let loser = t.submit(BOB, request_id).await;
        t.market
            .select_report(REQUESTER, request_id, winner, 8_000)
            .await
            .unwrap();
        loser
    }

    #[tokio::test]
    async fn test_double_return_stake_refused() {
        let t = TestMarket::new();
        let loser = completed_with_loser(&t).await;
        let hook = ReenteringRecipient::new(Attack::ReturnStakeAgain(loser), false);
        hook.arm(&t, BOB);

        let returned = t.market.return_stake(BOB, loser).await.unwrap();

        assert_eq!(returned, units(1, 100));
        assert_eq!(
            hook.outcomes(),
            vec![Err(MarketError::ReentrantCall {
                operation: "return_stake"
            })]
        );
        assert_eq!(t.wallets.balance_of(&BOB), FUNDING, "paid exactly once");
        assert_eq!(t.market.report(loser).unwrap().stake, 0);

        // Outside the delivery the ordinary guard applies.
        let err = t.market.return_stake(BOB, loser).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(hook.outcomes().len(), 1, "no delivery, no hook");
    }

    #[tokio::test]
    async fn test_propagated_failure_rolls_back_outer_call() {
        let t = TestMarket::new();
        let loser = completed_with_loser(&t).await;
        let hook = ReenteringRecipient::new(Attack::ReturnStakeAgain(loser), true);
        hook.arm(&t, BOB);

        let err = t.market.return_stake(BOB, loser).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(t.market.report(loser).unwrap().stake, units(1, 100));
        assert_eq!(t.wallets.balance_of(&BOB), FUNDING - units(1, 100));
        assert!(t.market.snapshot().is_consistent());
    }

    #[tokio::test]
    async fn test_nested_selection_refused() {
        let t = TestMarket::new();
        let loser = completed_with_loser(&t).await;

        // BOB also requested something and has a pending report on it.
        let own_request = t.open_request(BOB).await;
        let own_report = t.submit(MALLORY, own_request).await;

        let hook = ReenteringRecipient::new(
            Attack::SelectOther {
                request: own_request,
                report: own_report,
            },
            false,
        );
        hook.arm(&t, BOB);

        t.market.return_stake(BOB, loser).await.unwrap();

        assert!(matches!(
            hook.outcomes().as_slice(),
            [Err(MarketError::ReentrantCall { operation: "select_report" })]
        ));
        let request = t.market.request(own_request).unwrap();
        assert_eq!(request.selected_report, None);
        assert_eq!(t.market.report(own_report).unwrap().stake, units(1, 100));
    }

    #[tokio::test]
    async fn test_nested_submission_refused() {
        let t = TestMarket::new();
        let loser = completed_with_loser(&t).await;
        let open = t.open_request(REQUESTER).await;
        let hook = ReenteringRecipient::new(Attack::SubmitReport(open), false);
        hook.arm(&t, BOB);

        t.market.return_stake(BOB, loser).await.unwrap();

        assert!(matches!(
            hook.outcomes().as_slice(),
            [Err(MarketError::ReentrantCall { .. })]
        ));
        assert!(!t.market.has_submitted(open, &BOB));
    }

    #[tokio::test]
    async fn test_winner_hook_cannot_double_collect() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(BOB, request_id).await;
        let hook = ReenteringRecipient::new(Attack::ReturnStakeAgain(report_id), false);
        hook.arm(&t, BOB);

        t.market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap();

        assert!(matches!(
            hook.outcomes().as_slice(),
            [Err(MarketError::ReentrantCall { .. })]
        ));
        assert_eq!(
            t.wallets.balance_of(&BOB),
            FUNDING - units(1, 100) + units(105, 1000)
        );
        assert_eq!(t.market.total_held(), t.market.accumulated_fees());
    }

    #[tokio::test]
    async fn test_winner_sees_settled_state_during_payout() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;
        let hook = ObservingRecipient::arm(&t, ALICE, request_id, report_id);

        t.market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap();

        assert_eq!(
            hook.seen(),
            vec![Observed {
                status: Some(RequestStatus::Completed),
                stake: Some(0),
                fees: units(5, 1000),
            }]
        );
    }

    #[tokio::test]
    async fn test_loser_sees_zeroed_stake_during_refund() {
        let t = TestMarket::new();
        let loser = completed_with_loser(&t).await;
        let request_id = t.market.report(loser).unwrap().request_id;
        let hook = ObservingRecipient::arm(&t, BOB, request_id, loser);

        t.market.return_stake(BOB, loser).await.unwrap();

        let seen = hook.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].stake, Some(0));
        assert_eq!(seen[0].status, Some(RequestStatus::Completed));
    }

    #[tokio::test]
    async fn test_views_after_rejected_payout_show_committed_state() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;
        let hook = ObservingRecipient::arm(&t, ALICE, request_id, report_id);
        t.wallets.reject_receipts(ALICE);

        let err = t
            .market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert!(hook.seen().is_empty(), "refused before the hook ran");
        assert_eq!(
            t.market.request(request_id).unwrap().status,
            RequestStatus::InProgress
        );
        assert_eq!(t.market.report(report_id).unwrap().stake, units(1, 100));
        assert_eq!(t.market.accumulated_fees(), 0);
    }
}
