//! Single-resolution signal observable by any number of waiters.
//!
//! The first [`Sender::settle`] wins; every [`Receiver`] clone observes
//! the same value. Dropping or abandoning the sender before it settles
//! wakes all waiters with [`RecvError::SenderDropped`].

use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use super::oneshot::RecvError;

////////////////////////////////////////////////////////////////////////////////

enum SharedState<T> {
    Pending(Vec<Waker>),
    Settled(T),
    SenderDropped,
}

impl<T> SharedState<T> {
    fn is_pending(&self) -> bool {
        matches!(self, SharedState::Pending(_))
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct Sender<T> {
    shared: Rc<RefCell<SharedState<T>>>,
}

impl<T> Sender<T> {
    /// Returns `false` if the signal had already been settled or abandoned.
    pub fn settle(&self, value: T) -> bool {
        self.transition(SharedState::Settled(value))
    }

    pub fn abandon(&self) -> bool {
        self.transition(SharedState::SenderDropped)
    }

    fn transition(&self, next: SharedState<T>) -> bool {
        let wakers = {
            let mut shared = self.shared.borrow_mut();
            if !shared.is_pending() {
                return false;
            }
            match std::mem::replace(&mut *shared, next) {
                SharedState::Pending(wakers) => wakers,
                _ => unreachable!(),
            }
        };
        wakers.into_iter().for_each(Waker::wake);
        true
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        self.abandon();
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct Receiver<T> {
    shared: Rc<RefCell<SharedState<T>>>,
}

impl<T: Clone> Receiver<T> {
    /// Settled value, if any, without registering a waiter.
    pub fn peek(&self) -> Option<Result<T, RecvError>> {
        match &*self.shared.borrow() {
            SharedState::Pending(_) => None,
            SharedState::Settled(value) => Some(Ok(value.clone())),
            SharedState::SenderDropped => Some(Err(RecvError::SenderDropped)),
        }
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone> Future for Receiver<T> {
    type Output = Result<T, RecvError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.borrow_mut();
        match &mut *shared {
            SharedState::Pending(wakers) => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
            SharedState::Settled(value) => Poll::Ready(Ok(value.clone())),
            SharedState::SenderDropped => Poll::Ready(Err(RecvError::SenderDropped)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let shared = Rc::new(RefCell::new(SharedState::Pending(Vec::new())));
    let sender = Sender {
        shared: shared.clone(),
    };
    let receiver = Receiver { shared };
    (sender, receiver)
}

////////////////////////////////////////////////////////////////////////////////
