use std::{rc::Rc, time::Duration};

use tokio::task::LocalSet;

use blocktimer::{
    BlockTimer, CountdownConfigBuilder, CountdownError, CountdownState, Scheduler, Timer,
    TokioScheduler,
};

use common::{transport, Reading, ScriptedClock};

mod common;

////////////////////////////////////////////////////////////////////////////////

const T0: u64 = 1_700_000_000;

////////////////////////////////////////////////////////////////////////////////

#[tokio::test(start_paused = true)]
async fn timer_resolves_in_time() {
    let rt = LocalSet::new();
    rt.run_until(async {
        let scheduler = Rc::new(TokioScheduler::new());
        let timer = Timer::new(5, scheduler.clone());
        timer.start();
        assert_eq!(timer.wait().await, Ok(()));
        assert!(timer.is_complete());

        let now = scheduler.now();
        assert!(now >= Duration::from_secs(5));
        assert!(now < Duration::from_secs(6));
    })
    .await;
}

////////////////////////////////////////////////////////////////////////////////

#[tokio::test(start_paused = true)]
async fn block_timer_follows_clock() {
    let rt = LocalSet::new();
    rt.run_until(async {
        let scheduler = Rc::new(TokioScheduler::new());
        let clock = ScriptedClock::stepping(T0, 12, 5);
        let config = CountdownConfigBuilder::new()
            .poll_interval(Duration::from_secs(12))
            .build();
        let timer = BlockTimer::with_config(clock.clone(), 60, scheduler.clone(), config);
        timer.start();

        let waiters: Vec<_> = (0..3)
            .map(|_| tokio::task::spawn_local(timer.wait()))
            .collect();
        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), Ok(()));
        }
        assert_eq!(clock.reads(), 6);
        assert_eq!(timer.state(), CountdownState::Completed);
        assert!(!timer.is_polling());
    })
    .await;
}

////////////////////////////////////////////////////////////////////////////////

#[tokio::test(start_paused = true)]
async fn stop_from_another_task() {
    let rt = LocalSet::new();
    rt.run_until(async {
        let scheduler = Rc::new(TokioScheduler::new());
        let timer = Rc::new(Timer::new(10, scheduler));
        timer.start();

        let stopper = tokio::task::spawn_local({
            let timer = timer.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                timer.stop();
            }
        });

        assert_eq!(timer.wait().await, Ok(()));
        stopper.await.unwrap();
        assert_eq!(timer.remaining(), 8);
        assert_eq!(timer.state(), CountdownState::Stopped);
    })
    .await;
}

////////////////////////////////////////////////////////////////////////////////

#[tokio::test(start_paused = true)]
async fn clock_failure_rejects() {
    let rt = LocalSet::new();
    rt.run_until(async {
        let scheduler = Rc::new(TokioScheduler::new());
        let clock = ScriptedClock::new([
            Reading::At(T0),
            Reading::At(T0 + 10),
            Reading::Fail(transport("503 Service Unavailable")),
        ]);
        let timer = BlockTimer::new(clock.clone(), 60, scheduler);
        timer.start();

        assert_eq!(
            timer.wait().await,
            Err(CountdownError::Clock(transport("503 Service Unavailable")))
        );
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(clock.reads(), 3);
        assert_eq!(timer.state(), CountdownState::Failed);
    })
    .await;
}

////////////////////////////////////////////////////////////////////////////////

#[tokio::test(start_paused = true)]
async fn dropped_countdown_abandons_waiters() {
    let rt = LocalSet::new();
    rt.run_until(async {
        let scheduler = Rc::new(TokioScheduler::new());
        let clock = ScriptedClock::at([T0]);
        let timer = BlockTimer::new(clock, 60, scheduler);
        timer.start();
        let waiter = tokio::task::spawn_local(timer.wait());

        tokio::time::sleep(Duration::from_secs(3)).await;
        drop(timer);
        assert_eq!(waiter.await.unwrap(), Err(CountdownError::Abandoned));
    })
    .await;
}
