/// Tag for the Settle event, logged once when a winning bid is accepted.
pub const SETTLE_EVENT_TAG: u8 = 0;

/// Tag for the Authorize event, logged when collectible ownership has been
/// verified against the registry.
pub const AUTHORIZE_EVENT_TAG: u8 = 1;
