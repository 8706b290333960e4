// tests/backlog_properties.rs

use proptest::prelude::*;
use taskpace::engine::{Backlog, CoreState, Priority, TaskId, TaskSpec};
use taskpace::exec::Payload;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Op {
    Admit(Priority),
    Pop,
    Cancel(usize),
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Urgent), Just(Priority::Normal)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => priority_strategy().prop_map(Op::Admit),
        2 => Just(Op::Pop),
        1 => any::<usize>().prop_map(Op::Cancel),
    ]
}

fn noop_payload() -> Payload {
    Payload::from_fn(|| Ok(String::new()))
}

/// Reference model: a flat list in admission order. The next task is the
/// oldest urgent one, or else the oldest normal one.
fn model_pop(model: &mut Vec<(TaskId, Priority)>) -> Option<(TaskId, Priority)> {
    let pos = model
        .iter()
        .position(|(_, p)| *p == Priority::Urgent)
        .or(if model.is_empty() { None } else { Some(0) })?;
    Some(model.remove(pos))
}

proptest! {
    #[test]
    fn core_dequeues_like_a_stable_priority_partition(
        ops in proptest::collection::vec(op_strategy(), 1..60)
    ) {
        // `CoreState` allocates ids and never touches Tokio beyond `Instant`.
        let now = Instant::now();
        let mut core = CoreState::new(None);
        let mut model: Vec<(TaskId, Priority)> = Vec::new();
        let mut admitted: Vec<TaskId> = Vec::new();
        // Drain loop activity the core should report after each step.
        let mut draining = false;

        for op in ops {
            match op {
                Op::Admit(priority) => {
                    let spec = TaskSpec::new("t", priority).with_payload(noop_payload());
                    let admitted_task = core.admit(spec, now).expect("valid spec");
                    prop_assert_eq!(admitted_task.start_drain, !draining);
                    draining = true;
                    model.push((admitted_task.id, priority));
                    admitted.push(admitted_task.id);
                }
                Op::Pop => {
                    let expected = model_pop(&mut model);
                    if expected.is_none() {
                        draining = false;
                    }
                    let started = core.start_next(now);
                    prop_assert_eq!(
                        started.as_ref().map(|s| (s.id, s.priority)),
                        expected
                    );
                }
                Op::Cancel(pick) => {
                    if admitted.is_empty() {
                        continue;
                    }
                    let id = admitted[pick % admitted.len()];
                    let was_waiting = model.iter().any(|(queued, _)| *queued == id);
                    let cancelled = core.cancel(id, now).is_some();
                    prop_assert_eq!(cancelled, was_waiting);
                    model.retain(|(queued, _)| *queued != id);
                }
            }

            prop_assert_eq!(core.backlog_len(), model.len());
            prop_assert_eq!(core.is_draining(), draining);
            let expected_order: Vec<TaskId> = {
                let mut urgent: Vec<TaskId> = model.iter().filter(|(_, p)| *p == Priority::Urgent).map(|(id, _)| *id).collect();
                urgent.extend(model.iter().filter(|(_, p)| *p == Priority::Normal).map(|(id, _)| *id));
                urgent
            };
            prop_assert_eq!(core.pending_ids(), expected_order);
        }
    }

    #[test]
    fn ids_are_never_reused(count in 1usize..100) {
        let now = Instant::now();
        let mut core = CoreState::new(Some(std::time::Duration::ZERO));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..count {
            let spec = TaskSpec::new("t", Priority::Normal).with_payload(noop_payload());
            let id = core.admit(spec, now).expect("valid spec").id;
            prop_assert!(seen.insert(id));
            prop_assert!(core.cancel(id, now).is_some());
        }
    }
}

#[test]
fn backlog_remove_keeps_relative_order() {
    let now = Instant::now();
    let mut core = CoreState::new(None);
    let ids: Vec<TaskId> = (0..4)
        .map(|_| {
            core.admit(TaskSpec::new("t", Priority::Normal).with_payload(noop_payload()), now)
                .expect("valid spec")
                .id
        })
        .collect();

    let mut backlog = Backlog::new();
    for id in &ids {
        backlog.push(*id, Priority::Normal);
    }

    assert!(backlog.remove(ids[1], Priority::Normal));
    assert!(!backlog.remove(ids[1], Priority::Normal));
    assert!(!backlog.remove(ids[2], Priority::Urgent), "wrong lane");
    assert_eq!(backlog.iter().collect::<Vec<_>>(), vec![ids[0], ids[2], ids[3]]);
    assert_eq!(backlog.pop_next(), Some((ids[0], Priority::Normal)));
    assert_eq!(backlog.len(), 2);
}
