pub mod forward;
pub mod gate;

pub use forward::{
    Deliver, DeliveryError, Forwarded, RemoteForwarder, RemoteLogMessage, maybe_forward,
};
pub use gate::RemoteGate;
