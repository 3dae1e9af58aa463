//! A Dutch (descending-price) auction for a single CIS-2 collectible, with
//! the payment leg settled in a CIS-2 fungible token instead of CCD.
//!
//! Bids carry no CCD; the bid amount is a token amount pulled from the bidder
//! over the payment token's `transfer`, which the bidder enables beforehand
//! by granting this instance an operator right on the token contract. Both
//! settlement legs run inside the winning `bid` call; if either fails the
//! whole call is rolled back and the auction stays open.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
