use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecvError {
    SenderDropped,
}

////////////////////////////////////////////////////////////////////////////////

enum SharedState<T> {
    Initial,
    ReceiverWait(std::task::Waker),
    SenderSent(T),
    SenderDropped,
    ReceiverDropped,
    Consumed,
}

////////////////////////////////////////////////////////////////////////////////

pub struct Sender<T> {
    shared: Rc<RefCell<SharedState<T>>>,
}

impl<T> Sender<T> {
    pub fn send(self, value: T) -> Result<(), T> {
        if let SharedState::ReceiverDropped = *self.shared.borrow() {
            return Err(value);
        }
        self.set_state(SharedState::SenderSent(value));
        Ok(())
    }

    fn set_state(&self, state: SharedState<T>) {
        let prev = std::mem::replace(&mut *self.shared.borrow_mut(), state);
        // wake after the borrow is released, the woken task may poll right away
        if let SharedState::ReceiverWait(waker) = prev {
            waker.wake();
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if let SharedState::SenderSent(_) | SharedState::ReceiverDropped | SharedState::Consumed =
            &*self.shared.borrow()
        {
            return;
        }
        self.set_state(SharedState::SenderDropped);
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct Receiver<T> {
    shared: Rc<RefCell<SharedState<T>>>,
}

impl<T> Future for Receiver<T> {
    type Output = Result<T, RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.borrow_mut();
        let state = std::mem::replace(&mut *shared, SharedState::Consumed);
        match state {
            SharedState::Initial | SharedState::ReceiverWait(_) => {
                *shared = SharedState::ReceiverWait(cx.waker().clone());
                Poll::Pending
            }
            SharedState::SenderSent(value) => Poll::Ready(Ok(value)),
            SharedState::SenderDropped => {
                *shared = SharedState::SenderDropped;
                Poll::Ready(Err(RecvError::SenderDropped))
            }
            SharedState::ReceiverDropped | SharedState::Consumed => {
                unreachable!("receiver polled after completion")
            }
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        *self.shared.borrow_mut() = SharedState::ReceiverDropped;
    }
}

////////////////////////////////////////////////////////////////////////////////

pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let shared = Rc::new(RefCell::new(SharedState::Initial));
    let sender = Sender {
        shared: shared.clone(),
    };
    let receiver = Receiver { shared };
    (sender, receiver)
}

////////////////////////////////////////////////////////////////////////////////
