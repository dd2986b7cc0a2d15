//! Remote control of Zahner Thales workstations.
//!
//! Term, the Thales measurement software, accepts Remote Script commands on
//! TCP port 260. This crate bundles the layers needed to talk to it.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connection to Term
//! - [`frame`]: telegram framing and the session handshake
//! - [`connection`]: session lifecycle, background receiver, reply queue
//! - [`script`]: typed Remote Script commands and impedance sweeps

/// Re-export transport types.
pub mod transport {
    pub use thales_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use thales_frame::*;
}

/// Re-export connection types.
pub mod connection {
    pub use thales_connection::*;
}

/// Re-export Remote Script types.
pub mod script {
    pub use thales_script::*;
}
