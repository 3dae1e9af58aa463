use commons::SETTLE_EVENT_TAG;
use concordium_std::*;

/// An untagged settlement event.
#[derive(Debug, Serialize, SchemaType)]
pub struct SettleEvent {
    /// Account whose bid was accepted.
    pub winner: AccountAddress,
    /// The accepted bid amount, forwarded to the seller.
    pub price: Amount,
}

/// Tagged custom event to be serialized for the event log.
#[derive(Debug)]
pub enum DutchAuctionEvent {
    /// A winning bid was accepted and settled.
    Settle(SettleEvent),
}

impl Serial for DutchAuctionEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            DutchAuctionEvent::Settle(event) => {
                out.write_u8(SETTLE_EVENT_TAG)?;
                event.serial(out)
            }
        }
    }
}
