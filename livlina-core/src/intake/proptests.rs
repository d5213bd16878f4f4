//! Property tests: arbitrary call sequences never move a session backwards
//! except through the resolver fallback, `retry` and `reset`, and never
//! dispatch more than once per record.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use super::*;
use crate::dispatch::DispatchSettings;
use crate::resolver::ResolverError;
use crate::testing::{RecordingChannel, StubResolver};
use crate::time::SystemClock;

#[derive(Debug, Clone)]
enum Op {
    SelectType(usize),
    ChooseLocation(bool),
    Coordinates(f64, f64, bool),
    Address(String),
    Attachments(usize),
    Confirm,
    Retry,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::SelectType),
        any::<bool>().prop_map(Op::ChooseLocation),
        (-100.0f64..100.0, -200.0f64..200.0, any::<bool>())
            .prop_map(|(lat, lon, ok)| Op::Coordinates(lat, lon, ok)),
        "[ a-z]{0,8}".prop_map(Op::Address),
        (0usize..3).prop_map(Op::Attachments),
        Just(Op::Confirm),
        Just(Op::Retry),
        Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn steps_only_move_forward(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let channel = Arc::new(RecordingChannel::new());
            let dispatcher = AlertDispatcher::new(channel.clone(), DispatchSettings::new("1"));
            let good = StubResolver::answering("Somewhere 1");
            let bad = StubResolver::failing(ResolverError::Unavailable);
            let mut session = IntakeSession::new();
            let mut confirmed = 0usize;

            for op in ops {
                let before = session.step();
                let mut rewinds = false;
                let result = match op {
                    Op::SelectType(i) => session.select_type(EmergencyKind::ALL[i]),
                    Op::ChooseLocation(coords) => session.choose_location_method(if coords {
                        LocationMethod::Coordinates
                    } else {
                        LocationMethod::Address
                    }),
                    Op::Coordinates(lat, lon, ok) => {
                        let resolver: &dyn AddressResolver = if ok { &good } else { &bad };
                        session
                            .submit_coordinates(lat, lon, resolver, Duration::from_millis(50))
                            .await
                    }
                    Op::Address(text) => session.submit_address(&text),
                    Op::Attachments(n) => session.submit_attachments(
                        (0..n).map(|i| Attachment::new(format!("{i}.png"), vec![i as u8])).collect(),
                    ),
                    Op::Confirm => {
                        let result = session.confirm_submission(&dispatcher, &SystemClock).await;
                        if result.is_ok() {
                            confirmed += 1;
                        }
                        result.map(|_| session.step())
                    }
                    Op::Retry => {
                        rewinds = true;
                        session.retry()
                    }
                    Op::Reset => {
                        rewinds = true;
                        Ok(session.reset())
                    }
                };

                match result {
                    Ok(after) => {
                        prop_assert_eq!(after, session.step());
                        if !rewinds {
                            prop_assert!(after.rank() > before.rank());
                        }
                    }
                    Err(_) => prop_assert_eq!(before, session.step()),
                }
                prop_assert_eq!(channel.text_calls(), confirmed);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
