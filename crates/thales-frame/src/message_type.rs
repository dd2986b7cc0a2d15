//! Well-known telegram message types.
//!
//! The type byte is opaque to the transport; these are the values Term uses.

/// Remote Script commands and their replies.
pub const REMOTE_SCRIPT: u8 = 0x02;

/// Connection management (session termination).
pub const CONTROL: u8 = 0x04;

/// Application launch control (e.g. switching Thales into Remote Script).
pub const APP_CONTROL: u8 = 0x80;

/// Payload of the CONTROL telegram that ends a session.
pub const DISCONNECT_PAYLOAD: [u8; 2] = [0xFF, 0xFF];

/// Returns a human-readable name for a message type.
pub fn message_type_name(message_type: u8) -> &'static str {
    match message_type {
        REMOTE_SCRIPT => "REMOTE_SCRIPT",
        CONTROL => "CONTROL",
        APP_CONTROL => "APP_CONTROL",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(message_type_name(2), "REMOTE_SCRIPT");
        assert_eq!(message_type_name(4), "CONTROL");
        assert_eq!(message_type_name(0x80), "APP_CONTROL");
        assert_eq!(message_type_name(9), "UNKNOWN");
    }
}
