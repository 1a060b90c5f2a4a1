//! # Inbound Ports
//!
//! API trait defining what the raffle draw subsystem can do.

use async_trait::async_trait;
use crate::domain::{EntryProof, Period, Raffle, RaffleError, RaffleId, TransparencyReport};

/// Raffle API - inbound port.
///
/// Close and draw are the two state-changing entry points. External
/// schedulers and the HTTP layer call them; the subsystem owns no timers.
#[async_trait]
pub trait RaffleApi: Send + Sync {
    /// Commit the entry set of `period` and move its raffle to CLOSED.
    ///
    /// Creates the OPEN raffle first if the period has none yet.
    async fn close_period(&self, period: Period) -> Result<Raffle, RaffleError>;

    /// Draw the winner of a CLOSED raffle and move it to DRAWN.
    async fn draw_winner(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError>;

    /// Load a raffle.
    async fn get_raffle(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError>;

    /// Look up the raffle of a period, if any.
    async fn find_by_period(&self, period: &Period) -> Result<Option<Raffle>, RaffleError>;

    /// Inclusion proof for the entry at `index` of a committed raffle.
    async fn inclusion_proof(
        &self,
        raffle_id: RaffleId,
        index: u64,
    ) -> Result<EntryProof, RaffleError>;

    /// Public verification bundle of a DRAWN raffle.
    async fn transparency_report(
        &self,
        raffle_id: RaffleId,
    ) -> Result<TransparencyReport, RaffleError>;
}
