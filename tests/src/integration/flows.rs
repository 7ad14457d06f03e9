//! # Integration Test Flows
//!
//! End-to-end request lifecycles across custody, both ledgers, the agent
//! directory and the notification bus.
//!
//! ## Flows Tested:
//!
//! 1. **Round trip**: bounty in, stake in, selection pays `reward + stake`, fee retained
//! 2. **Losing researchers**: stake returned unchanged after another report wins
//! 3. **Deadline and duplicate rejections**: no state change on failure
//! 4. **Reputation protocol**: selection raises agent reputation and verifies once

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use rb_03_request_ledger::RequestStatus;
    use rb_04_report_ledger::{NewReport, ReportStatus};
    use rb_05_marketplace::{MarketAdminApi, MarketConfig, MarketError, MarketplaceApi};
    use shared_bus::{EventFilter, EventTopic, MarketEvent};
    use shared_types::{units, Amount, CallContext, ErrorKind, UNIT};

    // =============================================================================
    // ROUND TRIP
    // =============================================================================

    /// minBounty 0.01, minStake 0.005, fee 5%: bounty 0.1, stake 0.01 → 0.105 out, 0.005 fee.
    #[tokio::test]
    async fn test_reference_scenario_payout() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;
        let before = t.wallets.balance_of(&ALICE);

        t.market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap();

        assert_eq!(t.wallets.balance_of(&ALICE) - before, units(105, 1000));
        assert_eq!(t.market.accumulated_fees(), units(5, 1000));
        assert_eq!(t.wallets.balance_of(&REQUESTER), FUNDING - units(1, 10));
    }

    /// researcher gains `B*(100-fee)/100 + S`, fees gain `B*fee/100`, for several fees.
    #[tokio::test]
    async fn test_round_trip_for_each_fee() {
        for fee in [0u8, 1, 5, 7, 10] {
            let t = TestMarket::new();
            t.market.set_fee_percent(ADMIN, fee).await.unwrap();

            let bounty: Amount = 333_333_333_333_333_333;
            let stake = units(7, 1000);
            let request_id = t
                .market
                .create_request(
                    CallContext::from_caller(REQUESTER).with_value(bounty),
                    "odd bounty".to_string(),
                    NOW + DAY,
                )
                .await
                .unwrap();
            let report_id = t
                .market
                .submit_report(
                    CallContext::from_caller(BOB).with_value(stake),
                    NewReport::new(request_id, "bafy-odd", [1; 32]),
                )
                .await
                .unwrap();

            t.market
                .select_report(REQUESTER, request_id, report_id, 8_000)
                .await
                .unwrap();

            let fee_amount = bounty * Amount::from(fee) / 100;
            assert_eq!(
                t.wallets.balance_of(&BOB),
                FUNDING - stake + (bounty - fee_amount) + stake,
                "fee {fee}%"
            );
            assert_eq!(t.market.accumulated_fees(), fee_amount, "fee {fee}%");
            assert_eq!(t.market.total_held(), fee_amount);
        }
    }

    // =============================================================================
    // LOSING RESEARCHERS
    // =============================================================================

    #[tokio::test]
    async fn test_second_researcher_reclaims_exact_stake() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let first = t.submit(ALICE, request_id).await;
        let second = t.submit(BOB, request_id).await;

        t.market
            .select_report(REQUESTER, request_id, first, 8_000)
            .await
            .unwrap();

        let returned = t.market.return_stake(BOB, second).await.unwrap();
        assert_eq!(returned, units(1, 100));
        assert_eq!(t.wallets.balance_of(&BOB), FUNDING);

        let report = t.market.report(second).unwrap();
        assert_eq!(report.stake, 0);
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(t.market.total_held(), t.market.accumulated_fees());
    }

    #[tokio::test]
    async fn test_stake_locked_until_completion() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;

        let err = t.market.return_stake(ALICE, report_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(t.wallets.balance_of(&ALICE), FUNDING - units(1, 100));
    }

    #[tokio::test]
    async fn test_winner_cannot_reclaim_stake_again() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;
        t.market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap();
        let balance = t.wallets.balance_of(&ALICE);

        let err = t.market.return_stake(ALICE, report_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(t.wallets.balance_of(&ALICE), balance);
    }

    // =============================================================================
    // REJECTIONS LEAVE NO TRACE
    // =============================================================================

    #[tokio::test]
    async fn test_submission_at_deadline_rejected() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        t.clock.set(NOW + DAY);

        let err = t
            .market
            .submit_report(
                CallContext::from_caller(ALICE).with_value(units(1, 100)),
                NewReport::new(request_id, "late", [0; 32]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::State);
        assert!(err.to_string().contains("Deadline passed"));
        let request = t.market.request(request_id).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.submitted_reports.is_empty());
        assert!(!t.market.has_submitted(request_id, &ALICE));
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected_before_and_after_selection() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(ALICE, request_id).await;

        let resubmit = || {
            t.market.submit_report(
                CallContext::from_caller(ALICE).with_value(units(1, 100)),
                NewReport::new(request_id, "second try", [0; 32]),
            )
        };

        let err = resubmit().await.unwrap_err();
        assert!(err.to_string().contains("Already submitted"));
        assert_eq!(err.kind(), ErrorKind::State);

        t.market
            .select_report(REQUESTER, request_id, report_id, 8_000)
            .await
            .unwrap();
        // Completed requests refuse reports outright; the pair stays recorded.
        assert_eq!(resubmit().await.unwrap_err().kind(), ErrorKind::State);
        assert!(t.market.has_submitted(request_id, &ALICE));
        assert_eq!(t.market.reports_for(request_id).len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_without_reports() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        t.submit(ALICE, request_id).await;

        let err = t
            .market
            .cancel_request(REQUESTER, request_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(
            t.market.request(request_id).unwrap().status,
            RequestStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_creation_validation() {
        let t = TestMarket::new();
        let ctx = CallContext::from_caller(REQUESTER);

        let cases = [
            (ctx.with_value(units(1, 1000)), "q", NOW + DAY),
            (ctx.with_value(units(1, 10)), "q", NOW),
            (ctx.with_value(units(1, 10)), "   ", NOW + DAY),
        ];
        for (ctx, query, deadline) in cases {
            let err = t
                .market
                .create_request(ctx, query.to_string(), deadline)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
        }
        assert_eq!(t.market.total_held(), 0);
        assert_eq!(t.wallets.balance_of(&REQUESTER), FUNDING);
    }

    // =============================================================================
    // REPUTATION PROTOCOL
    // =============================================================================

    #[tokio::test]
    async fn test_repeated_wins_verify_agent_once() {
        let mut config = MarketConfig::with_admin(ADMIN);
        config.verification_threshold = 25;
        let t = TestMarket::with_config(config);
        let mut agents = t.bus.subscribe(EventFilter::topics(vec![EventTopic::Agents]));

        let agent_id = t
            .market
            .register_agent(
                CallContext::from_caller(ALICE).with_value(units(1, 10)),
                "atlas".to_string(),
                "lending".to_string(),
            )
            .await
            .unwrap();

        for round in 1..=4u64 {
            let request_id = t.open_request(REQUESTER).await;
            let report_id = t.submit(ALICE, request_id).await;
            let outcome = t
                .market
                .select_report(REQUESTER, request_id, report_id, 9_100 + round as u32)
                .await
                .unwrap();
            let change = outcome.reputation.unwrap();
            assert_eq!(change.new_score, round * 10);
            assert_eq!(change.newly_verified, round == 3);
        }

        let agent = t.market.agent(agent_id).unwrap();
        assert!(agent.is_verified);
        assert_eq!(agent.reputation, 40);
        assert_eq!(agent.completed_tasks, 4);
        assert_eq!(agent.accuracy_bps, 9_104);

        let verified: Vec<_> = agents
            .drain()
            .into_iter()
            .filter(|e| matches!(e, MarketEvent::AgentVerified { .. }))
            .collect();
        assert_eq!(verified, vec![MarketEvent::AgentVerified { agent_id }]);
    }

    #[tokio::test]
    async fn test_out_of_range_accuracy_ignored() {
        let t = TestMarket::new();
        let agent_id = t
            .market
            .register_agent(
                CallContext::from_caller(BOB).with_value(units(1, 10)),
                "hermes".to_string(),
                "bridges".to_string(),
            )
            .await
            .unwrap();
        let request_id = t.open_request(REQUESTER).await;
        let report_id = t.submit(BOB, request_id).await;

        t.market
            .select_report(REQUESTER, request_id, report_id, 10_001)
            .await
            .unwrap();

        let agent = t.market.agent(agent_id).unwrap();
        assert_eq!(agent.accuracy_bps, 7_500);
        assert_eq!(agent.reputation, 10);
    }

    #[tokio::test]
    async fn test_full_lifecycle_events() {
        let t = TestMarket::new();
        let mut all = t.bus.subscribe(EventFilter::all());

        let request_id = t.open_request(REQUESTER).await;
        let winner = t.submit(ALICE, request_id).await;
        let loser = t.submit(BOB, request_id).await;
        t.market
            .select_report(REQUESTER, request_id, winner, 8_000)
            .await
            .unwrap();
        t.market.return_stake(BOB, loser).await.unwrap();
        t.market
            .raise_dispute(CallContext::from_caller(BOB), winner)
            .await
            .unwrap();
        t.market.slash_report_stake(ADMIN, winner).await.unwrap();
        t.market.withdraw_fees(ADMIN, ADMIN).await.unwrap();

        let topics: Vec<_> = all.drain().iter().map(MarketEvent::topic).collect();
        assert_eq!(
            topics,
            vec![
                EventTopic::Requests,
                EventTopic::Reports,
                EventTopic::Reports,
                EventTopic::Reports,
                EventTopic::Reports,
                EventTopic::Reports,
                EventTopic::Reports,
                EventTopic::Admin,
            ]
        );
        assert_eq!(t.wallets.balance_of(&ADMIN), units(5, 1000));
        assert_eq!(t.market.total_held(), 0);
        assert_eq!(
            t.market.request(request_id).unwrap().status,
            RequestStatus::Disputed
        );
    }

    #[tokio::test]
    async fn test_disputed_request_freezes_losing_stakes() {
        let t = TestMarket::new();
        let request_id = t.open_request(REQUESTER).await;
        let winner = t.submit(ALICE, request_id).await;
        let loser = t.submit(BOB, request_id).await;
        t.market
            .select_report(REQUESTER, request_id, winner, 8_000)
            .await
            .unwrap();
        t.market
            .raise_dispute(CallContext::from_caller(REQUESTER), winner)
            .await
            .unwrap();

        let err = t.market.return_stake(BOB, loser).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(t.market.report(loser).unwrap().stake, units(1, 100));

        // Only the disputed report can be slashed; the loser stays frozen.
        let err = t.market.slash_report_stake(ADMIN, loser).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(t.market.report(loser).unwrap().stake, units(1, 100));
        assert_eq!(t.market.report(loser).unwrap().status, ReportStatus::Submitted);

        let err = t
            .market
            .raise_dispute(CallContext::from_caller(REQUESTER), winner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State, "already disputed");
    }
}
