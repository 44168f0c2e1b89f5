//! Handler registry: a table of `(type, handler, name)` tuples plus a
//! parallel broadcast list for the frame types in `BROADCAST_TYPES`.
//!
//! Registration is fallible and capacity-bounded, the way the upstream
//! PGN dispatcher bounds its own registration table. For a non-broadcast
//! type, only the first handler registered is kept; later registrations
//! for the same type are rejected rather than silently replacing it.

use steer_common::consts::MAX_HANDLERS;
use thiserror::Error;

use crate::context::RouterContext;
use crate::frame::Frame;

/// Frame types that may have more than one handler.
pub const BROADCAST_TYPES: [u8; 2] = [200, 202];

pub type HandlerFn = fn(&Frame, &mut RouterContext) -> Option<Frame>;

struct Registration {
    type_id: u8,
    name: &'static str,
    handler: HandlerFn,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler registry is at capacity ({0} handlers)")]
    AtCapacity(usize),
    #[error("a handler is already registered for non-broadcast type {0}")]
    AlreadyRegistered(u8),
}

/// Capacity-bounded table of frame-type handlers.
pub struct HandlerRegistry {
    registrations: heapless::Vec<Registration, MAX_HANDLERS>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            registrations: heapless::Vec::new(),
        }
    }

    fn is_broadcast(type_id: u8) -> bool {
        BROADCAST_TYPES.contains(&type_id)
    }

    /// Register `handler` under `type_id`. For non-broadcast types, fails
    /// if one is already registered; first registered wins.
    pub fn register(
        &mut self,
        type_id: u8,
        name: &'static str,
        handler: HandlerFn,
    ) -> Result<(), RegistryError> {
        if !Self::is_broadcast(type_id)
            && self.registrations.iter().any(|r| r.type_id == type_id)
        {
            return Err(RegistryError::AlreadyRegistered(type_id));
        }
        self.registrations
            .push(Registration {
                type_id,
                name,
                handler,
            })
            .map_err(|_| RegistryError::AtCapacity(MAX_HANDLERS))
    }

    pub fn unregister(&mut self, type_id: u8, name: &'static str) {
        let keep: heapless::Vec<Registration, MAX_HANDLERS> = self
            .registrations
            .iter()
            .filter(|r| !(r.type_id == type_id && r.name == name))
            .map(|r| Registration {
                type_id: r.type_id,
                name: r.name,
                handler: r.handler,
            })
            .collect::<heapless::Vec<_, MAX_HANDLERS>>();
        self.registrations = keep;
    }

    pub fn list(&self) -> impl Iterator<Item = (u8, &'static str)> + '_ {
        self.registrations.iter().map(|r| (r.type_id, r.name))
    }

    /// Invoke every handler registered for `frame.type_id`, collecting any
    /// outbound reply frames each produces. Returns `None` if no handler is
    /// registered for that type (a counted "unknown type" drop upstream).
    pub fn dispatch(
        &self,
        frame: &Frame,
        ctx: &mut RouterContext,
    ) -> Option<heapless::Vec<Frame, 4>> {
        let mut matched = false;
        let mut out = heapless::Vec::new();
        for reg in self.registrations.iter().filter(|r| r.type_id == frame.type_id) {
            matched = true;
            if let Some(reply) = (reg.handler)(frame, ctx) {
                let _ = out.push(reply);
            }
        }
        matched.then_some(out)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::dummy_context;

    fn noop_handler(_frame: &Frame, _ctx: &mut RouterContext) -> Option<Frame> {
        None
    }

    fn reply_handler(_frame: &Frame, _ctx: &mut RouterContext) -> Option<Frame> {
        Some(Frame::new(0, 126, &[]).unwrap())
    }

    #[test]
    fn non_broadcast_type_rejects_second_registration() {
        let mut reg = HandlerRegistry::new();
        reg.register(254, "steer_data", noop_handler).unwrap();
        let err = reg.register(254, "steer_data_v2", noop_handler).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered(254));
    }

    #[test]
    fn broadcast_type_accepts_multiple_registrations() {
        let mut reg = HandlerRegistry::new();
        reg.register(200, "hello_a", reply_handler).unwrap();
        reg.register(200, "hello_b", reply_handler).unwrap();
        assert_eq!(reg.list().filter(|(t, _)| *t == 200).count(), 2);
    }

    #[test]
    fn dispatch_returns_none_for_unregistered_type() {
        let reg = HandlerRegistry::new();
        let frame = Frame::new(0, 99, &[]).unwrap();
        let mut store = dummy_context();
        assert!(reg.dispatch(&frame, &mut store.ctx()).is_none());
    }

    #[test]
    fn dispatch_collects_all_broadcast_replies() {
        let mut reg = HandlerRegistry::new();
        reg.register(200, "a", reply_handler).unwrap();
        reg.register(200, "b", reply_handler).unwrap();
        let frame = Frame::new(0, 200, &[]).unwrap();
        let mut store = dummy_context();
        let replies = reg.dispatch(&frame, &mut store.ctx()).unwrap();
        assert_eq!(replies.len(), 2);
    }

    #[test]
    fn registration_fails_past_capacity() {
        let mut reg = HandlerRegistry::new();
        for i in 0..MAX_HANDLERS {
            reg.register(200, Box::leak(i.to_string().into_boxed_str()), reply_handler)
                .unwrap();
        }
        let err = reg.register(200, "overflow", reply_handler).unwrap_err();
        assert_eq!(err, RegistryError::AtCapacity(MAX_HANDLERS));
    }
}
