//! Hover-to-arm timing for palette drags.
//!
//! The timer never calls back on its own. Scheduling hands out a
//! [`HoverTicket`]; whoever owns the real timer delivers the ticket back once
//! the delay has passed. Every schedule or cancel bumps a generation counter,
//! so a ticket from an abandoned hover is recognised as stale and ignored.

use std::time::{Duration, Instant};

use crate::domain::FieldId;

/// Proof that a hover was scheduled, redeemed when the delay elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTicket {
    generation: u64,
    field_id: FieldId,
    fires_at: Instant,
}

impl HoverTicket {
    /// The field being hovered.
    #[must_use]
    pub const fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    /// When the hover arms.
    #[must_use]
    pub const fn fires_at(&self) -> Instant {
        self.fires_at
    }
}

/// A single cancellable hover timer.
#[derive(Debug, Clone)]
pub struct HoverTimer {
    delay: Duration,
    generation: u64,
    pending: Option<HoverTicket>,
}

impl HoverTimer {
    /// Creates an idle timer with the given arming delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Starts timing a hover over `field_id`, replacing any pending one.
    pub fn schedule(&mut self, field_id: FieldId, now: Instant) -> HoverTicket {
        self.generation += 1;
        let ticket = HoverTicket {
            generation: self.generation,
            field_id,
            fires_at: now + self.delay,
        };
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Abandons any pending hover. Outstanding tickets become stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// The hover currently being timed.
    #[must_use]
    pub const fn pending(&self) -> Option<&HoverTicket> {
        self.pending.as_ref()
    }

    /// Whether `ticket` belongs to the hover currently being timed.
    #[must_use]
    pub fn is_current(&self, ticket: &HoverTicket) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation)
    }

    /// Redeems a ticket. Returns the hovered field if the ticket is current
    /// and due; the timer is then idle.
    pub fn fire(&mut self, ticket: &HoverTicket, now: Instant) -> Option<FieldId> {
        if !self.is_current(ticket) || now < ticket.fires_at {
            return None;
        }
        self.pending.take().map(|pending| pending.field_id)
    }

    /// Fires the pending hover if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<FieldId> {
        let ticket = self.pending.clone()?;
        self.fire(&ticket, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(2);

    #[test]
    fn fires_after_delay() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        let ticket = timer.schedule("f".into(), start);

        assert_eq!(timer.fire(&ticket, start + Duration::from_millis(500)), None);
        assert_eq!(timer.fire(&ticket, start + DELAY), Some("f".into()));
        assert!(timer.pending().is_none());
    }

    #[test]
    fn fires_only_once() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        let ticket = timer.schedule("f".into(), start);

        assert!(timer.fire(&ticket, start + DELAY).is_some());
        assert!(timer.fire(&ticket, start + DELAY).is_none());
    }

    #[test]
    fn cancelled_ticket_is_stale() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        let ticket = timer.schedule("f".into(), start);

        timer.cancel();

        assert!(!timer.is_current(&ticket));
        assert_eq!(timer.fire(&ticket, start + DELAY), None);
    }

    #[test]
    fn rescheduling_invalidates_previous_ticket() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        let first = timer.schedule("a".into(), start);
        let second = timer.schedule("b".into(), start);

        assert_eq!(timer.fire(&first, start + DELAY), None);
        assert_eq!(timer.fire(&second, start + DELAY), Some("b".into()));
    }

    #[test]
    fn same_field_rescheduled_keeps_only_latest() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        let first = timer.schedule("a".into(), start);
        timer.cancel();
        let _second = timer.schedule("a".into(), start + DELAY);

        // the old ticket was due, but its hover was abandoned
        assert_eq!(timer.fire(&first, start + DELAY), None);
    }

    #[test]
    fn poll_fires_due_hover() {
        let mut timer = HoverTimer::new(DELAY);
        let start = Instant::now();
        timer.schedule("a".into(), start);

        assert_eq!(timer.poll(start), None);
        assert_eq!(timer.poll(start + DELAY), Some("a".into()));
        assert_eq!(timer.poll(start + DELAY * 2), None);
    }
}
