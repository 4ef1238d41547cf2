//! Minimal FIFO state machine.
//!
//! An ordered list of states; `step` runs only the head state. A state ends
//! itself through [`StateControl::complete`], letting the next one take over
//! on the following step. States can also preempt themselves (insert at the
//! head) or queue follow-ups (insert at the tail).

use std::collections::VecDeque;
use std::fmt;

pub trait State<C>: Send + Sync {
    fn step(&mut self, ctx: &mut C, control: &mut StateControl<C>);

    fn name(&self) -> &'static str;
}

/// Where a new state goes relative to the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// Run before the current state, which resumes afterwards.
    Front,
    /// Run after every state already queued.
    Back,
}

/// Requests a state makes of its machine during a step.
pub struct StateControl<C> {
    completed: bool,
    inserted: Vec<(Box<dyn State<C>>, Insert)>,
}

impl<C> StateControl<C> {
    fn new() -> Self {
        Self { completed: false, inserted: Vec::new() }
    }

    /// Remove the running state once this step returns.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn add_state(&mut self, state: impl State<C> + 'static, at: Insert) {
        self.inserted.push((Box::new(state), at));
    }
}

pub struct StateMachine<C> {
    states: VecDeque<Box<dyn State<C>>>,
}

impl<C> Default for StateMachine<C> {
    fn default() -> Self {
        Self { states: VecDeque::new() }
    }
}

impl<C> StateMachine<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: impl State<C> + 'static, at: Insert) {
        self.insert_boxed(Box::new(state), at);
    }

    fn insert_boxed(&mut self, state: Box<dyn State<C>>, at: Insert) {
        match at {
            Insert::Front => self.states.push_front(state),
            Insert::Back => self.states.push_back(state),
        }
    }

    /// Step the head state. Returns false when there was nothing to run.
    pub fn step(&mut self, ctx: &mut C) -> bool {
        let Some(head) = self.states.front_mut() else { return false };
        let mut control = StateControl::new();
        head.step(ctx, &mut control);

        if control.completed {
            self.states.pop_front();
        }
        for (state, at) in control.inserted {
            self.insert_boxed(state, at);
        }
        true
    }

    pub fn current(&self) -> Option<&'static str> {
        self.states.front().map(|state| state.name())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

impl<C> fmt::Debug for StateMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.states.iter().map(|state| state.name())).finish()
    }
}
