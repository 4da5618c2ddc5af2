use std::sync::Arc;

use futures::task::ArcWake;

use super::rt::{TaskId, WakeQueue};

////////////////////////////////////////////////////////////////////////////////

pub(crate) struct TaskWaker {
    task_id: TaskId,
    queue: WakeQueue,
}

impl TaskWaker {
    pub fn new(task_id: TaskId, queue: WakeQueue) -> Self {
        Self { task_id, queue }
    }
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.queue.push(arc_self.task_id);
    }
}
