//! # Randomized Invariant Checks
//!
//! Drives the marketplace with seeded random operation sequences (valid and
//! invalid, from arbitrary callers) and checks the global invariants after
//! every step:
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | Value conservation | wallets + custody == minted |
//! | Custody matches ledgers | `MarketState::is_consistent` |
//! | Selected report iff Completed/Disputed | per request |
//! | One report per (request, researcher) | per request |
//! | Accuracy within 0..=10000 | per agent |
//! | Verification never reverts | across steps |
//! | Fee percent ≤ ceiling | every step |
//! | Failed operations change nothing | custody total and counts |

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rb_02_agent_directory::MAX_ACCURACY_BPS;
    use rb_03_request_ledger::RequestStatus;
    use rb_04_report_ledger::{NewReport, ReportStatus, MAX_FEE_PERCENT_CEILING};
    use rb_05_marketplace::{MarketAdminApi, MarketConfig, MarketResult, MarketplaceApi};
    use shared_types::{
        units, Address, AgentId, Amount, CallContext, ReportId, RequestId, TimeSource,
    };
    use std::collections::HashSet;

    const ACTORS: [Address; 6] = [REQUESTER, ALICE, BOB, MALLORY, [0x02; 20], [0x03; 20]];
    const STEPS: usize = 400;

    struct Driver {
        t: TestMarket,
        rng: StdRng,
        minted: Amount,
        verified: HashSet<AgentId>,
        failures: usize,
    }

    impl Driver {
        fn new(seed: u64) -> Self {
            let mut config = MarketConfig::with_admin(ADMIN);
            config.verification_threshold = 30;
            let t = TestMarket::with_actors(config, &ACTORS);
            Self {
                t,
                rng: StdRng::seed_from_u64(seed),
                minted: FUNDING * ACTORS.len() as Amount,
                verified: HashSet::new(),
                failures: 0,
            }
        }

        fn actor(&mut self) -> Address {
            ACTORS[self.rng.gen_range(0..ACTORS.len())]
        }

        fn request_id(&mut self) -> RequestId {
            let count = self.t.market.snapshot().requests().request_count() as u64;
            RequestId(self.rng.gen_range(1..=count + 1))
        }

        fn report_id(&mut self) -> ReportId {
            let count = self.t.market.snapshot().reports().reports().count() as u64;
            ReportId(self.rng.gen_range(1..=count + 1))
        }

        fn agent_id(&mut self) -> AgentId {
            let count = self.t.market.snapshot().directory().agent_count() as u64;
            AgentId(self.rng.gen_range(1..=count + 1))
        }

        /// Around the minimums, so some calls fall short.
        fn value(&mut self, minimum: Amount) -> Amount {
            self.rng.gen_range(minimum / 2..=minimum * 3)
        }

        async fn step(&mut self) {
            let before = self.t.market.snapshot();
            let market = self.t.market.clone();
            let caller = self.actor();
            let now = self.t.clock.now();

            let result: MarketResult<()> = match self.rng.gen_range(0..14) {
                0 | 1 => {
                    let bounty = self.value(units(1, 100));
                    let deadline = now + self.rng.gen_range(0..3) * DAY / 2;
                    market
                        .create_request(
                            CallContext::from_caller(caller).with_value(bounty),
                            "randomized".to_string(),
                            deadline,
                        )
                        .await
                        .map(drop)
                }
                2 | 3 | 4 => {
                    let stake = self.value(units(5, 1000));
                    let request_id = self.request_id();
                    let artifact = if self.rng.gen_bool(0.95) { "bafy" } else { "" };
                    market
                        .submit_report(
                            CallContext::from_caller(caller).with_value(stake),
                            NewReport::new(request_id, artifact, [0; 32]),
                        )
                        .await
                        .map(drop)
                }
                5 | 6 => {
                    let request_id = self.request_id();
                    let report_id = self.report_id();
                    let accuracy = self.rng.gen_range(0..=MAX_ACCURACY_BPS + 500);
                    let caller = match market.request(request_id) {
                        Some(r) if self.rng.gen_bool(0.8) => r.requester,
                        _ => caller,
                    };
                    market
                        .select_report(caller, request_id, report_id, accuracy)
                        .await
                        .map(drop)
                }
                7 => {
                    let report_id = self.report_id();
                    let caller = match market.report(report_id) {
                        Some(r) if self.rng.gen_bool(0.8) => r.researcher,
                        _ => caller,
                    };
                    market.return_stake(caller, report_id).await.map(drop)
                }
                8 => {
                    let request_id = self.request_id();
                    market.cancel_request(caller, request_id).await.map(drop)
                }
                9 => {
                    let report_id = self.report_id();
                    market
                        .raise_dispute(CallContext::from_caller(caller), report_id)
                        .await
                        .map(drop)
                }
                10 => {
                    let report_id = self.report_id();
                    let caller = if self.rng.gen_bool(0.7) { ADMIN } else { caller };
                    market.slash_report_stake(caller, report_id).await.map(drop)
                }
                11 => {
                    let stake = self.value(units(1, 10));
                    market
                        .register_agent(
                            CallContext::from_caller(caller).with_value(stake),
                            "agent".to_string(),
                            "general".to_string(),
                        )
                        .await
                        .map(drop)
                }
                12 => {
                    let agent_id = self.agent_id();
                    let amount = self.value(units(1, 10));
                    match self.rng.gen_range(0..4) {
                        0 => market.deactivate_agent(caller, agent_id).await,
                        1 => market.reactivate_agent(caller, agent_id).await,
                        2 => market
                            .withdraw_stake(caller, agent_id, amount)
                            .await
                            .map(drop),
                        _ => market
                            .slash_agent_stake(ADMIN, agent_id, amount)
                            .await
                            .map(drop),
                    }
                }
                _ => {
                    if self.rng.gen_bool(0.5) {
                        let fee = self.rng.gen_range(0..=MAX_FEE_PERCENT_CEILING + 5);
                        market.set_fee_percent(ADMIN, fee).await
                    } else {
                        self.t.clock.advance(self.rng.gen_range(0..DAY));
                        Ok(())
                    }
                }
            };

            if result.is_err() {
                self.failures += 1;
                let after = self.t.market.snapshot();
                assert_eq!(after.custody().total_held(), before.custody().total_held());
                assert_eq!(after.requests().request_count(), before.requests().request_count());
                assert_eq!(after.reports().reports().count(), before.reports().reports().count());
                assert_eq!(after.directory().agent_count(), before.directory().agent_count());
            }
            self.check();
        }

        fn check(&mut self) {
            let state = self.t.market.snapshot();

            let in_wallets: Amount = ACTORS
                .iter()
                .chain(std::iter::once(&ADMIN))
                .map(|a| self.t.wallets.balance_of(a))
                .sum();
            assert_eq!(in_wallets + state.custody().total_held(), self.minted);
            assert!(state.is_consistent());

            assert!(state.reports().policy().fee_percent() <= MAX_FEE_PERCENT_CEILING);

            for request in state.requests().requests() {
                let settled = matches!(
                    request.status,
                    RequestStatus::Completed | RequestStatus::Disputed
                );
                assert_eq!(request.selected_report.is_some(), settled, "{}", request.id);
                if let Some(selected) = request.selected_report {
                    let report = state.reports().report(selected).unwrap();
                    assert_eq!(report.request_id, request.id);
                    if request.status == RequestStatus::Completed {
                        assert_eq!(report.status, ReportStatus::Selected);
                    }
                }

                let reports = state.reports().reports_for(request.id);
                let researchers: HashSet<_> = reports.iter().map(|r| r.researcher).collect();
                assert_eq!(researchers.len(), reports.len());
                assert_eq!(request.submitted_reports.len(), reports.len());
            }

            for agent in state.directory().agents() {
                assert!(agent.accuracy_bps <= MAX_ACCURACY_BPS);
                if self.verified.contains(&agent.id) {
                    assert!(agent.is_verified, "{} lost verification", agent.id);
                }
                if agent.is_verified {
                    self.verified.insert(agent.id);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_invariants_hold_under_random_sequences() {
        for seed in [1u64, 7, 42, 1_337, 90_210] {
            let mut driver = Driver::new(seed);
            for _ in 0..STEPS {
                driver.step().await;
            }
            assert!(driver.failures > 0, "seed {seed} exercised no failures");
            assert!(driver.failures < STEPS, "seed {seed} never succeeded");
        }
    }
}
