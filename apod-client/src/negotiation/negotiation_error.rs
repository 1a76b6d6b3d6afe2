use crate::negotiation::NegotiationState;
use crate::signaling::ChannelError;
use apod_core::SdpKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("only an initiator in state New may create an offer (state={state:?})")]
    CannotInitiate { state: NegotiationState },

    #[error("answer received while in state {state:?}")]
    UnexpectedAnswer { state: NegotiationState },

    #[error("offer received after a local description was set (state={state:?})")]
    LocalDescriptionAlreadySet { state: NegotiationState },

    #[error("unsupported session description type {0:?}")]
    UnsupportedDescription(SdpKind),

    #[error("media transport rejected the operation")]
    Transport(#[source] anyhow::Error),

    #[error("failed to send negotiation envelope")]
    Signaling(#[from] ChannelError),
}
