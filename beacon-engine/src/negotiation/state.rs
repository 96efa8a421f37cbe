use std::fmt;

/// Which side of the offer/answer exchange a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRole {
    /// Local side sends media and originates the offer.
    HostSide,
    /// Local side receives media and answers.
    ViewerSide,
}

impl SessionRole {
    /// How the remote participant is named in user-facing errors.
    pub fn remote_label(self) -> &'static str {
        match self {
            SessionRole::HostSide => "viewer",
            SessionRole::ViewerSide => "host",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    /// Local tracks are being validated and attached.
    CapabilityCheck,
    Offering,
    OfferSent,
    Answering,
    Established,
    Failed,
    Closed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NegotiationState::Failed | NegotiationState::Closed)
    }

    pub fn can_transition_to(self, next: NegotiationState) -> bool {
        use NegotiationState::*;

        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Failed) | (_, Closed) => true,
            (Idle, CapabilityCheck) | (Idle, Offering) | (Idle, Answering) => true,
            (CapabilityCheck, Offering) | (CapabilityCheck, Idle) => true,
            (Offering, OfferSent) | (Offering, Idle) => true,
            (OfferSent, Established) => true,
            (Answering, Established) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationState::Idle => "idle",
            NegotiationState::CapabilityCheck => "capability-check",
            NegotiationState::Offering => "offering",
            NegotiationState::OfferSent => "offer-sent",
            NegotiationState::Answering => "answering",
            NegotiationState::Established => "established",
            NegotiationState::Failed => "failed",
            NegotiationState::Closed => "closed",
        };
        f.write_str(name)
    }
}
