//! Two-phase mutual-consent restart handshake.
//!
//! One seat requests, the *other* seat confirms or declines. Only a
//! confirmation from the non-requesting seat lets the board be cleared.

use crate::types::SeatId;
use tracing::{debug, info, instrument};

/// Why a restart request was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RestartError {
    /// A request is already outstanding.
    #[display("A restart request from seat {requester} is already pending")]
    AlreadyPending {
        /// Seat holding the outstanding request.
        requester: SeatId,
    },
    /// Both seats have not joined yet.
    #[display("The game has not started")]
    NotStarted,
    /// A seat has left; nothing can be restarted.
    #[display("The session has ended")]
    SessionEnded,
}

/// How a confirm/decline was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartResolution {
    /// Nothing pending, or the requester answered its own request.
    Ignored,
    /// The other seat agreed; the board must be reset.
    Confirmed {
        /// Seat that made the request.
        requester: SeatId,
    },
    /// The other seat refused; the board stays as is.
    Declined {
        /// Seat that made the request.
        requester: SeatId,
        /// Seat that refused.
        decliner: SeatId,
    },
}

/// Holds at most one outstanding restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestartCoordinator {
    pending: Option<SeatId>,
}

impl RestartCoordinator {
    /// Creates a coordinator with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat with an outstanding request, if any.
    pub fn pending(&self) -> Option<SeatId> {
        self.pending
    }

    /// Records a request from `seat`.
    #[instrument(skip(self))]
    pub fn request(&mut self, seat: SeatId) -> Result<(), RestartError> {
        if let Some(requester) = self.pending {
            debug!(%requester, "Restart already pending");
            return Err(RestartError::AlreadyPending { requester });
        }
        self.pending = Some(seat);
        info!(%seat, "Restart requested");
        Ok(())
    }

    /// Applies a confirm (`accept == true`) or decline from `seat`.
    ///
    /// Clears the pending request on `Confirmed` and `Declined`.
    #[instrument(skip(self))]
    pub fn respond(&mut self, seat: SeatId, accept: bool) -> RestartResolution {
        let Some(requester) = self.pending else {
            debug!(%seat, "No restart pending");
            return RestartResolution::Ignored;
        };
        if requester == seat {
            debug!(%seat, "Requester cannot answer its own restart request");
            return RestartResolution::Ignored;
        }
        self.pending = None;
        if accept {
            info!(%requester, confirmer = %seat, "Restart confirmed");
            RestartResolution::Confirmed { requester }
        } else {
            info!(%requester, decliner = %seat, "Restart declined");
            RestartResolution::Declined {
                requester,
                decliner: seat,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_by_other_seat() {
        let mut rc = RestartCoordinator::new();
        rc.request(SeatId::First).unwrap();
        assert_eq!(
            rc.respond(SeatId::Second, true),
            RestartResolution::Confirmed {
                requester: SeatId::First,
            }
        );
        assert_eq!(rc.pending(), None);
    }

    #[test]
    fn test_requester_cannot_confirm() {
        let mut rc = RestartCoordinator::new();
        rc.request(SeatId::Second).unwrap();
        assert_eq!(rc.respond(SeatId::Second, true), RestartResolution::Ignored);
        assert_eq!(
            rc.respond(SeatId::Second, false),
            RestartResolution::Ignored
        );
        assert_eq!(rc.pending(), Some(SeatId::Second));
    }

    #[test]
    fn test_respond_without_request_is_ignored() {
        let mut rc = RestartCoordinator::new();
        assert_eq!(rc.respond(SeatId::First, true), RestartResolution::Ignored);
    }

    #[test]
    fn test_decline_allows_new_request() {
        let mut rc = RestartCoordinator::new();
        rc.request(SeatId::First).unwrap();
        assert_eq!(
            rc.respond(SeatId::Second, false),
            RestartResolution::Declined {
                requester: SeatId::First,
                decliner: SeatId::Second,
            }
        );
        assert!(rc.request(SeatId::First).is_ok());
    }

    #[test]
    fn test_second_request_rejected_while_pending() {
        let mut rc = RestartCoordinator::new();
        rc.request(SeatId::First).unwrap();
        assert_eq!(
            rc.request(SeatId::Second),
            Err(RestartError::AlreadyPending {
                requester: SeatId::First,
            })
        );
    }
}
