//! Property test: the participant counter always equals the number of
//! active registrations, whatever sequence of operations ran

mod helpers;

use proptest::prelude::*;

use campus_wall::models::{BatchUpdateStatusRequest, CancelRegistrationRequest, RegistrationStatus};
use helpers::*;

#[derive(Debug, Clone)]
enum Op {
    Register(i64),
    Cancel(i64),
    CheckIn(i64),
    Override(Vec<i64>, RegistrationStatus),
}

fn status_strategy() -> impl Strategy<Value = RegistrationStatus> {
    prop_oneof![
        Just(RegistrationStatus::Canceled),
        Just(RegistrationStatus::Registered),
        Just(RegistrationStatus::Attended),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let user = 1i64..6;
    prop_oneof![
        user.clone().prop_map(Op::Register),
        user.clone().prop_map(Op::Cancel),
        user.clone().prop_map(Op::CheckIn),
        (prop::collection::vec(user, 1..4), status_strategy()).prop_map(|(users, status)| Op::Override(users, status)),
    ]
}

async fn run_ops(max_participants: Option<i32>, ops: Vec<Op>) {
    let ctx = TestContext::new();
    let organizer = TestContext::organizer();
    let event = ctx.open_event(running_event(max_participants)).await;

    for op in ops {
        match op {
            Op::Register(user_id) => {
                let _ = ctx.events().register_event(event.id, user_id, None).await;
            }
            Op::Cancel(user_id) => {
                let _ = ctx
                    .events()
                    .cancel_registration(event.id, user_id, CancelRegistrationRequest::default())
                    .await;
            }
            Op::CheckIn(user_id) => {
                if let Ok(view) = ctx.events().registration_status(event.id, user_id).await {
                    if view.status.is_some() {
                        let mine = ctx.events().my_registrations(user_id).await.unwrap();
                        let _ = ctx.registrations().check_in(&organizer, mine[0].id).await;
                    }
                }
            }
            Op::Override(users, status) => {
                let mut ids = Vec::new();
                for user_id in users {
                    if let Some(registration) = ctx.events().my_registrations(user_id).await.unwrap().first() {
                        ids.push(registration.id);
                    }
                }
                if !ids.is_empty() {
                    ctx.registrations()
                        .batch_update_status(&organizer, event.id, BatchUpdateStatusRequest { ids, status })
                        .await
                        .unwrap();
                }
            }
        }

        let stats = ctx.registrations().statistics(&organizer, event.id).await.unwrap();
        assert_eq!(i64::from(stats.current_participants), stats.registered + stats.attended);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn counter_matches_active_rows(
        max_participants in prop::option::of(1i32..4),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run_ops(max_participants, ops));
    }
}
