//! Seams between the tracker core and the outside world.
//!
//! The core never fetches anything itself; a binary or service supplies
//! batches through a [`PositionSource`].

use crate::feed::FeedError;
use crate::position::Position;

/// Produces batches of position reports.
pub trait PositionSource {
    /// Next batch of reports, or `None` once the source is exhausted.
    /// A polling source never returns `None`.
    fn fetch_batch(&mut self) -> Result<Option<Vec<Position>>, FeedError>;
}
