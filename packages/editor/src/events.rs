//! # Access Events
//!
//! Extension points raised after all built-in checks of an evaluator pass.
//! Listeners are registered explicitly and receive a mutable event seeded
//! with an allowed decision; the orchestrator trusts whatever decision state
//! remains after dispatch, so a listener can flip an allowed decision to
//! forbidden or vice versa.

use crate::direction::Direction;
use stanza_model::{AccessDecision, Entity};

/// Raised before a paragraph move is allowed.
pub struct MoveAccessEvent<'a> {
    pub paragraph: &'a Entity,
    pub direction: Direction,
    decision: AccessDecision,
}

impl<'a> MoveAccessEvent<'a> {
    fn new(paragraph: &'a Entity, direction: Direction) -> Self {
        Self {
            paragraph,
            direction,
            // The built-in checks already passed.
            decision: AccessDecision::allowed(),
        }
    }

    pub fn decision(&self) -> &AccessDecision {
        &self.decision
    }

    pub fn set_decision(&mut self, decision: AccessDecision) {
        self.decision = decision;
    }
}

/// Raised before a paragraph add is allowed.
pub struct AddAccessEvent<'a> {
    pub parent: &'a Entity,
    pub field: &'a str,
    pub bundle: Option<&'a str>,
    decision: AccessDecision,
}

impl<'a> AddAccessEvent<'a> {
    fn new(parent: &'a Entity, field: &'a str, bundle: Option<&'a str>) -> Self {
        Self {
            parent,
            field,
            bundle,
            decision: AccessDecision::allowed(),
        }
    }

    pub fn decision(&self) -> &AccessDecision {
        &self.decision
    }

    pub fn set_decision(&mut self, decision: AccessDecision) {
        self.decision = decision;
    }
}

pub trait MoveAccessListener: Send + Sync {
    fn on_move_access(&self, event: &mut MoveAccessEvent<'_>);
}

pub trait AddAccessListener: Send + Sync {
    fn on_add_access(&self, event: &mut AddAccessEvent<'_>);
}

impl<F> MoveAccessListener for F
where
    F: Fn(&mut MoveAccessEvent<'_>) + Send + Sync,
{
    fn on_move_access(&self, event: &mut MoveAccessEvent<'_>) {
        self(event)
    }
}

impl<F> AddAccessListener for F
where
    F: Fn(&mut AddAccessEvent<'_>) + Send + Sync,
{
    fn on_add_access(&self, event: &mut AddAccessEvent<'_>) {
        self(event)
    }
}

/// Registry of access listeners, dispatched in registration order.
#[derive(Default)]
pub struct AccessEvents {
    move_listeners: Vec<Box<dyn MoveAccessListener>>,
    add_listeners: Vec<Box<dyn AddAccessListener>>,
}

impl AccessEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_move(&mut self, listener: impl MoveAccessListener + 'static) {
        self.move_listeners.push(Box::new(listener));
    }

    pub fn on_add(&mut self, listener: impl AddAccessListener + 'static) {
        self.add_listeners.push(Box::new(listener));
    }

    pub(crate) fn dispatch_move(&self, paragraph: &Entity, direction: Direction) -> AccessDecision {
        let mut event = MoveAccessEvent::new(paragraph, direction);
        for listener in &self.move_listeners {
            listener.on_move_access(&mut event);
        }
        event.decision
    }

    pub(crate) fn dispatch_add(
        &self,
        parent: &Entity,
        field: &str,
        bundle: Option<&str>,
    ) -> AccessDecision {
        let mut event = AddAccessEvent::new(parent, field, bundle);
        for listener in &self.add_listeners {
            listener.on_add_access(&mut event);
        }
        event.decision
    }
}
