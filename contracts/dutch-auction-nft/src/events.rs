use commons::{Token, AUTHORIZE_EVENT_TAG, SETTLE_EVENT_TAG};
use concordium_std::*;

/// An untagged settlement event.
#[derive(Debug, Serialize, SchemaType)]
pub struct SettleEvent {
    /// The collectible that changed hands.
    pub collectible: Token,
    /// Account whose bid was accepted.
    pub winner: AccountAddress,
    /// The accepted bid amount, forwarded to the seller.
    pub price: Amount,
}

/// An untagged ownership-verification event.
#[derive(Debug, Serialize, SchemaType)]
pub struct AuthorizeEvent {
    /// The collectible whose ownership was verified.
    pub collectible: Token,
    /// The verified owner.
    pub seller: AccountAddress,
}

/// Tagged custom event to be serialized for the event log.
#[derive(Debug)]
pub enum DutchAuctionEvent {
    /// A winning bid was accepted and settled.
    Settle(SettleEvent),
    /// The seller's ownership of the collectible was verified and bidding
    /// opened.
    Authorize(AuthorizeEvent),
}

impl Serial for DutchAuctionEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            DutchAuctionEvent::Settle(event) => {
                out.write_u8(SETTLE_EVENT_TAG)?;
                event.serial(out)
            }
            DutchAuctionEvent::Authorize(event) => {
                out.write_u8(AUTHORIZE_EVENT_TAG)?;
                event.serial(out)
            }
        }
    }
}
