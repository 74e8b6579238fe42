use clinic_queue::models::{parse_date, parse_time};
use clinic_queue::{
    create_appointment_request, Appointment, AppointmentStatus, Scheduler, SchedulerError,
    UrgencyLevel,
};
use proptest::prelude::*;

fn enqueue(scheduler: &mut Scheduler, name: &str, level: &str) -> String {
    let request = create_appointment_request(name, "2025-02-02", "09:00", level, None).unwrap();
    scheduler.enqueue_request(request).unwrap()
}

fn serve_all(scheduler: &mut Scheduler) -> Vec<String> {
    std::iter::from_fn(|| scheduler.serve_next())
        .map(|a| a.patient_name)
        .collect()
}

#[test]
fn critical_jumps_ahead_of_normal() {
    let mut scheduler = Scheduler::default();
    enqueue(&mut scheduler, "Alice", "normal");
    enqueue(&mut scheduler, "Bob", "critical");
    enqueue(&mut scheduler, "Carol", "normal");

    assert_eq!(serve_all(&mut scheduler), vec!["Bob", "Alice", "Carol"]);
}

#[test]
fn equal_levels_are_served_by_arrival() {
    let mut scheduler = Scheduler::default();
    enqueue(&mut scheduler, "Dan", "emergency");
    enqueue(&mut scheduler, "Eve", "emergency");

    assert_eq!(serve_all(&mut scheduler), vec!["Dan", "Eve"]);
}

#[test]
fn reprioritized_appointment_is_served_first() {
    let mut scheduler = Scheduler::default();
    enqueue(&mut scheduler, "Gina", "normal");
    enqueue(&mut scheduler, "Hank", "accident");
    let frank = enqueue(&mut scheduler, "Frank", "accident");

    let date = parse_date("2025-02-03").unwrap();
    let time = parse_time("08:00").unwrap();
    scheduler
        .reschedule(&frank, date, time, Some(UrgencyLevel::Critical))
        .unwrap();

    let next = scheduler.serve_next().unwrap();
    assert_eq!(next.patient_name, "Frank");
    assert_eq!(next.level, UrgencyLevel::Critical);
}

#[test]
fn serving_an_empty_scheduler_yields_nothing() {
    let mut scheduler = Scheduler::default();
    assert!(scheduler.serve_next().is_none());
    assert!(scheduler.peek_next().is_none());
}

#[test]
fn completing_unknown_id_is_not_pending() {
    let mut scheduler = Scheduler::default();
    assert_eq!(
        scheduler.complete("never-enqueued"),
        Err(SchedulerError::NotPending("never-enqueued".to_string()))
    );
}

#[test]
fn complete_is_idempotent() {
    let mut scheduler = Scheduler::default();
    let id = enqueue(&mut scheduler, "Ivy", "accident");

    let first = scheduler.complete(&id).unwrap();
    assert_eq!(first.status, AppointmentStatus::Completed);
    assert_eq!(scheduler.pending_count(), 0);

    assert_eq!(
        scheduler.complete(&id),
        Err(SchedulerError::NotPending(id.clone()))
    );
    assert!(scheduler.is_completed(&id));
    assert_eq!(scheduler.completed_count(), 1);
}

#[test]
fn served_patient_is_completed_or_rescheduled_by_id() {
    let mut scheduler = Scheduler::default();
    let nina = enqueue(&mut scheduler, "Nina", "emergency");
    let omar = enqueue(&mut scheduler, "Omar", "accident");
    enqueue(&mut scheduler, "Pia", "normal");

    assert_eq!(scheduler.serve_next().unwrap().appointment_id, nina);
    let done = scheduler.complete(&nina).unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);

    assert_eq!(scheduler.serve_next().unwrap().appointment_id, omar);
    let date = parse_date("2025-02-05").unwrap();
    let time = parse_time("13:00").unwrap();
    let moved = scheduler.reschedule(&omar, date, time, None).unwrap();
    assert_eq!(moved.status, AppointmentStatus::Pending);
    assert!(scheduler.in_service().is_empty());

    assert_eq!(serve_all(&mut scheduler), vec!["Omar", "Pia"]);
}

#[test]
fn reschedule_shows_once_under_new_values() {
    let mut scheduler = Scheduler::default();
    enqueue(&mut scheduler, "Jack", "normal");
    let kim = enqueue(&mut scheduler, "Kim", "normal");
    enqueue(&mut scheduler, "Lee", "emergency");

    let date = parse_date("2025-03-01").unwrap();
    let time = parse_time("16:45").unwrap();
    scheduler
        .reschedule(&kim, date, time, Some(UrgencyLevel::Emergency))
        .unwrap();

    let pending = scheduler.list_pending();
    let matches: Vec<&Appointment> = pending.iter().filter(|a| a.appointment_id == kim).collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].date, date);
    assert_eq!(matches[0].time, time);
    assert_eq!(matches[0].level, UrgencyLevel::Emergency);

    let counts = scheduler.level_counts();
    assert_eq!(counts.normal, 1);
    assert_eq!(counts.emergency, 2);

    let order: Vec<&str> = pending.iter().map(|a| a.patient_name.as_str()).collect();
    assert_eq!(order, vec!["Lee", "Kim", "Jack"]);
}

#[test]
fn listing_does_not_disturb_order() {
    let mut scheduler = Scheduler::default();
    enqueue(&mut scheduler, "Alice", "normal");
    enqueue(&mut scheduler, "Bob", "accident");

    let before = scheduler.list_pending();
    let again = scheduler.list_pending();
    assert_eq!(before, again);
    assert_eq!(serve_all(&mut scheduler), vec!["Bob", "Alice"]);
}

#[test]
fn invalid_level_is_rejected_at_the_boundary() {
    let err = create_appointment_request("Mia", "2025-02-02", "09:00", "urgent", None);
    assert_eq!(err, Err(SchedulerError::InvalidLevel("urgent".to_string())));
}

#[derive(Debug, Clone)]
enum Op {
    Enqueue(usize),
    Serve,
    Complete(usize),
    Reschedule(usize, Option<usize>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..4).prop_map(Op::Enqueue),
        1 => Just(Op::Serve),
        1 => any::<usize>().prop_map(Op::Complete),
        1 => (any::<usize>(), proptest::option::of(0usize..4))
            .prop_map(|(i, l)| Op::Reschedule(i, l)),
    ]
}

proptest! {
    #[test]
    fn serve_order_is_greedy(levels in proptest::collection::vec(0usize..4, 0..40)) {
        let mut scheduler = Scheduler::default();
        for (i, level) in levels.iter().enumerate() {
            let request = create_appointment_request(
                &format!("p{}", i),
                "2025-02-02",
                "09:00",
                UrgencyLevel::ALL[*level].as_str(),
                None,
            )
            .unwrap();
            scheduler.enqueue_request(request).unwrap();
        }

        let mut served = Vec::new();
        while let Some(apt) = scheduler.serve_next() {
            served.push((apt.level, apt.arrival()));
        }

        prop_assert_eq!(served.len(), levels.len());
        let mut expected = served.clone();
        expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        prop_assert_eq!(served, expected);
    }

    #[test]
    fn queue_sizes_match_pending(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut scheduler = Scheduler::default();
        let mut queued: Vec<String> = Vec::new();
        let date = parse_date("2025-02-02").unwrap();
        let time = parse_time("09:00").unwrap();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Enqueue(level) => {
                    let request = create_appointment_request(
                        &format!("p{}", step),
                        "2025-02-02",
                        "09:00",
                        UrgencyLevel::ALL[level].as_str(),
                        None,
                    )
                    .unwrap();
                    queued.push(scheduler.enqueue_request(request).unwrap());
                }
                Op::Serve => {
                    if let Some(apt) = scheduler.serve_next() {
                        queued.retain(|id| id != &apt.appointment_id);
                    }
                }
                Op::Complete(i) if !queued.is_empty() => {
                    let id = queued.remove(i % queued.len());
                    prop_assert!(scheduler.complete(&id).is_ok());
                    prop_assert!(scheduler.complete(&id).is_err());
                }
                Op::Reschedule(i, level) if !queued.is_empty() => {
                    let id = &queued[i % queued.len()];
                    let level = level.map(|l| UrgencyLevel::ALL[l]);
                    let moved = scheduler.reschedule(id, date, time, level).unwrap();
                    if let Some(level) = level {
                        prop_assert_eq!(moved.level, level);
                    }
                }
                _ => {}
            }

            prop_assert_eq!(scheduler.pending_count(), queued.len());
            prop_assert_eq!(scheduler.level_counts().total(), queued.len());
            prop_assert_eq!(scheduler.list_pending().len(), queued.len());
        }
    }
}
