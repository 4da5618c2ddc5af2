use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::Context,
};

use super::waker::TaskWaker;

////////////////////////////////////////////////////////////////////////////////

pub type TaskId = usize;

pub(crate) type Task = Pin<Box<dyn Future<Output = ()>>>;

////////////////////////////////////////////////////////////////////////////////

/// Ids of woken tasks; shared with wakers, which must be `Send + Sync`.
#[derive(Default, Clone)]
pub(crate) struct WakeQueue(Arc<Mutex<VecDeque<TaskId>>>);

impl WakeQueue {
    pub fn push(&self, task: TaskId) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }

    fn pop(&self) -> Option<TaskId> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct RuntimeState {
    tasks: HashMap<TaskId, Task>,
    running: Option<TaskId>,
    running_aborted: bool,
    next_task_id: TaskId,
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub(crate) struct Runtime {
    state: RefCell<RuntimeState>,
    queue: WakeQueue,
}

impl Runtime {
    pub fn spawn(&self, task: Task) -> TaskId {
        let task_id = {
            let mut state = self.state.borrow_mut();
            let task_id = state.next_task_id;
            state.next_task_id += 1;
            state.tasks.insert(task_id, task);
            task_id
        };
        self.queue.push(task_id);
        task_id
    }

    pub fn abort(&self, task_id: TaskId) {
        let task = {
            let mut state = self.state.borrow_mut();
            if state.running == Some(task_id) {
                state.running_aborted = true;
            }
            state.tasks.remove(&task_id)
        };
        // task is dropped after the state borrow is released,
        // dropping it can wake or abort other tasks of this runtime
        drop(task);
    }

    pub fn process_next_task(&self) -> bool {
        let Some(task_id) = self.queue.pop() else {
            return false;
        };
        let Some(mut task) = self.state.borrow_mut().tasks.remove(&task_id) else {
            // finished or aborted
            return true;
        };

        self.state.borrow_mut().running = Some(task_id);
        let poll_result = {
            let waker = futures::task::waker(Arc::new(TaskWaker::new(task_id, self.queue.clone())));
            let mut cx = Context::from_waker(&waker);
            task.as_mut().poll(&mut cx)
        };
        let aborted = {
            let mut state = self.state.borrow_mut();
            state.running = None;
            std::mem::take(&mut state.running_aborted)
        };

        if poll_result.is_pending() && !aborted {
            self.state.borrow_mut().tasks.insert(task_id, task);
        }

        true
    }

    pub fn process_tasks(&self) -> usize {
        let mut processed = 0;
        while self.process_next_task() {
            processed += 1;
        }
        processed
    }

    pub fn alive_tasks(&self) -> usize {
        self.state.borrow().tasks.len()
    }
}
