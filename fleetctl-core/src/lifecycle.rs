//! Order status lifecycle
//!
//! ```text
//! pending ──► received ──► in_transit ──► delivered
//!    │            │             │
//!    └────────────┴─────────────┴───────► rejected
//! ```
//!
//! `delivered` and `rejected` are terminal. Every accepted edge is a
//! [`Transition`], which the server uses to decide side effects (vehicle
//! status, tracking start, notifications).

use serde::Serialize;
use thiserror::Error;

use crate::models::OrderStatus;

/// Lifecycle violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is {status} and can no longer be modified")]
    Locked { status: OrderStatus },
}

/// An accepted status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Transition {
    /// Tracking starts on this edge.
    pub fn starts_trip(&self) -> bool {
        self.to == OrderStatus::InTransit
    }

    /// The assigned vehicle is released on this edge.
    pub fn releases_vehicle(&self) -> bool {
        self.to.is_terminal() && self.from == OrderStatus::InTransit
    }
}

impl OrderStatus {
    /// Statuses reachable in one step.
    pub fn next_states(self) -> &'static [OrderStatus] {
        use crate::models::OrderStatus::*;
        match self {
            Pending => &[Received, Rejected],
            Received => &[InTransit, Rejected],
            InTransit => &[Delivered, Rejected],
            Delivered | Rejected => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }

    /// Validate a move to `next`.
    ///
    /// # Example
    /// ```
    /// use fleetctl_core::models::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.transition(OrderStatus::Received).is_ok());
    /// assert!(OrderStatus::Pending.transition(OrderStatus::Delivered).is_err());
    /// ```
    pub fn transition(self, next: OrderStatus) -> Result<Transition, LifecycleError> {
        if self.can_transition_to(next) {
            Ok(Transition {
                from: self,
                to: next,
            })
        } else {
            Err(LifecycleError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Vehicle and driver may only be (re)assigned before the trip starts.
    pub fn ensure_assignable(self) -> Result<(), LifecycleError> {
        match self {
            OrderStatus::Pending | OrderStatus::Received => Ok(()),
            status => Err(LifecycleError::Locked { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::models::OrderStatus::*;

    #[test]
    fn happy_path() {
        let mut status = Pending;
        for next in [Received, InTransit, Delivered] {
            let t = status.transition(next).unwrap();
            assert_eq!(t.from, status);
            status = t.to;
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn rejection_from_every_open_state() {
        for from in [Pending, Received, InTransit] {
            assert!(from.can_transition_to(Rejected), "{from} -> rejected");
        }
    }

    #[test]
    fn skipping_states_is_invalid() {
        assert_eq!(
            Pending.transition(Delivered).unwrap_err(),
            LifecycleError::InvalidTransition {
                from: Pending,
                to: Delivered
            }
        );
        assert!(Pending.transition(InTransit).is_err());
        assert!(Received.transition(Delivered).is_err());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in OrderStatus::ALL {
            assert!(Delivered.transition(*to).is_err());
            assert!(Rejected.transition(*to).is_err());
        }
    }

    #[test]
    fn trip_edges() {
        assert!(Received.transition(InTransit).unwrap().starts_trip());
        assert!(InTransit.transition(Delivered).unwrap().releases_vehicle());
        assert!(InTransit.transition(Rejected).unwrap().releases_vehicle());
        assert!(!Pending.transition(Rejected).unwrap().releases_vehicle());
    }

    #[test]
    fn assignment_window() {
        assert!(Pending.ensure_assignable().is_ok());
        assert!(Received.ensure_assignable().is_ok());
        assert_eq!(
            InTransit.ensure_assignable().unwrap_err(),
            LifecycleError::Locked { status: InTransit }
        );
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn no_self_transitions(status in any_status()) {
            prop_assert!(status.transition(status).is_err());
        }

        #[test]
        fn accepted_edges_match_table(from in any_status(), to in any_status()) {
            let accepted = from.transition(to).is_ok();
            prop_assert_eq!(accepted, from.next_states().contains(&to));
        }

        #[test]
        fn random_walks_terminate(steps in prop::collection::vec(0usize..2, 0..10)) {
            let mut status = Pending;
            let mut taken = 0;
            for pick in steps {
                let options = status.next_states();
                if options.is_empty() {
                    break;
                }
                status = status.transition(options[pick % options.len()]).unwrap().to;
                taken += 1;
            }
            // Longest path is pending -> received -> in_transit -> delivered.
            prop_assert!(taken <= 3);
        }
    }
}
