use std::{cell::RefCell, rc::Rc, time::Duration};

use futures::FutureExt;

use crate::scheduler::Scheduler;

use super::{JoinError, Simulation};

////////////////////////////////////////////////////////////////////////////////

#[test]
fn spawn_and_join() {
    let sim = Simulation::new();
    let (tx, rx) = crate::util::oneshot::channel();

    let receiver = sim.spawn(async move { rx.await.unwrap() * 2 });
    sim.spawn(async move {
        tx.send(21).unwrap();
    });

    let processed = sim.run_until_stalled();
    assert!(processed >= 3);
    assert_eq!(receiver.now_or_never(), Some(Ok(42)));
}

////////////////////////////////////////////////////////////////////////////////

#[test]
fn sleeps_fire_in_deadline_order() {
    let sim = Simulation::new();
    let scheduler = sim.scheduler();
    let order = Rc::new(RefCell::new(Vec::new()));

    for secs in [3u64, 1, 2] {
        let scheduler = scheduler.clone();
        let order = order.clone();
        sim.spawn(async move {
            scheduler.sleep(Duration::from_secs(secs)).await;
            order.borrow_mut().push((secs, scheduler.now()));
        });
    }

    sim.advance(Duration::from_millis(1500));
    assert_eq!(*order.borrow(), vec![(1, Duration::from_secs(1))]);
    assert_eq!(sim.now(), Duration::from_millis(1500));

    sim.advance(Duration::from_secs(10));
    assert_eq!(
        *order.borrow(),
        vec![
            (1, Duration::from_secs(1)),
            (2, Duration::from_secs(2)),
            (3, Duration::from_secs(3)),
        ]
    );
    assert_eq!(sim.pending_timers(), 0);
}

////////////////////////////////////////////////////////////////////////////////

#[test]
fn step_jumps_to_next_deadline() {
    let sim = Simulation::new();
    let scheduler = sim.scheduler();
    let done = sim.spawn({
        let scheduler = scheduler.clone();
        async move {
            scheduler.sleep(Duration::from_secs(7)).await;
            scheduler.sleep(Duration::from_secs(3)).await;
        }
    });

    assert!(sim.step());
    assert_eq!(sim.now(), Duration::from_secs(7));
    assert!(sim.step());
    assert_eq!(sim.now(), Duration::from_secs(10));
    assert!(!sim.step());
    assert_eq!(done.now_or_never(), Some(Ok(())));
}

////////////////////////////////////////////////////////////////////////////////

#[test]
fn abort_drops_task_and_timer() {
    let sim = Simulation::new();
    let scheduler = sim.scheduler();
    let reached = Rc::new(RefCell::new(false));

    let handle = sim.spawn({
        let scheduler = scheduler.clone();
        let reached = reached.clone();
        async move {
            scheduler.sleep(Duration::from_secs(1)).await;
            *reached.borrow_mut() = true;
        }
    });
    sim.run_until_stalled();
    assert_eq!(sim.pending_timers(), 1);

    handle.abort();
    assert_eq!(sim.pending_timers(), 0);
    assert_eq!(sim.alive_tasks(), 0);

    sim.advance(Duration::from_secs(5));
    assert!(!*reached.borrow());
    assert_eq!(handle.now_or_never(), Some(Err(JoinError {})));
}

////////////////////////////////////////////////////////////////////////////////

#[test]
fn task_aborts_itself() {
    let sim = Simulation::new();
    let scheduler = sim.scheduler();
    let slot = Rc::new(RefCell::new(None));

    let handle = scheduler.spawn(Box::pin({
        let scheduler = scheduler.clone();
        let slot = slot.clone();
        async move {
            loop {
                scheduler.sleep(Duration::from_secs(1)).await;
                if let Some(handle) = slot.borrow_mut().take() {
                    crate::scheduler::PollHandle::cancel(handle);
                }
            }
        }
    }));
    *slot.borrow_mut() = Some(handle);

    sim.advance(Duration::from_secs(1));
    assert_eq!(sim.alive_tasks(), 0);
    assert_eq!(sim.pending_timers(), 0);
}

////////////////////////////////////////////////////////////////////////////////

#[test]
fn scheduler_outlives_simulation() {
    let sim = Simulation::new();
    let scheduler = sim.scheduler();
    drop(sim);

    assert_eq!(scheduler.now(), Duration::ZERO);
    scheduler.spawn(Box::pin(async {})).cancel();
    assert!(scheduler
        .sleep(Duration::from_secs(1))
        .now_or_never()
        .is_none());
}
