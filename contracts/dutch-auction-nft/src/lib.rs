//! A Dutch (descending-price) auction for a single CIS-2 collectible,
//! settled in CCD.
//!
//! The collectible stays with the seller for the whole lifetime of the
//! auction; the seller grants this instance an operator right on the registry
//! instead of depositing the token. The `authorize` entrypoint verifies the
//! seller's ownership once, before any bid can be accepted. The first bid at
//! or above the current price pays the seller and moves the collectible to
//! the bidder in the same call; if either transfer fails the whole call is
//! rolled back and the auction stays open.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod state;
