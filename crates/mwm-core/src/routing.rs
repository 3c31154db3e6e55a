//! `chrysler` section: the cross-tile routing context.
//!
//! Lists the road nodes where routes enter and leave the tile, a dense cost
//! matrix between every entry and exit, and the tiles each exit leads to.
//! All counts and fixed-width fields are little-endian `u32`; points are
//! 8-byte interleaved deltas from the container's base point.

use tracing::debug;

use crate::codec::{decode_delta, SectionReader};
use crate::error::{Error, Result};
use crate::geo::{CoordSpace, LatLon, Point};

/// Name of the section
pub const SECTION: &str = "chrysler";

/// Node where routes enter the tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingNode {
    /// Routing node id
    pub id: u32,
    /// Raw grid point
    pub point: Point,
    /// Projected point
    pub position: LatLon,
}

/// Node where routes leave the tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutgoingNode {
    /// Routing node id
    pub id: u32,
    /// Raw grid point
    pub point: Point,
    /// Projected point
    pub position: LatLon,
    /// Index into [`CrossTileGraph::neighbours`]
    pub neighbour_index: u8,
}

/// Decoded cross-tile routing table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTileGraph {
    /// Entry nodes
    pub incoming: Vec<IncomingNode>,
    /// Exit nodes
    pub outgoing: Vec<OutgoingNode>,
    /// Row-major `incoming x outgoing` route costs
    pub costs: Vec<u32>,
    /// Names of the adjacent tiles
    pub neighbours: Vec<String>,
}

impl CrossTileGraph {
    /// Decodes a `chrysler` section
    pub fn parse(reader: &mut SectionReader, space: &CoordSpace) -> Result<Self> {
        let count = read_count(reader, 12)?;
        let mut incoming = Vec::with_capacity(count);
        for _ in 0..count {
            let id = reader.read_u32()?;
            let point = read_point(reader, space)?;
            incoming.push(IncomingNode {
                id,
                point,
                position: space.to_4326(point),
            });
        }

        let count = read_count(reader, 13)?;
        let mut outgoing = Vec::with_capacity(count);
        for _ in 0..count {
            let id = reader.read_u32()?;
            let point = read_point(reader, space)?;
            let neighbour_index = reader.read_u8()?;
            outgoing.push(OutgoingNode {
                id,
                point,
                position: space.to_4326(point),
                neighbour_index,
            });
        }

        let at = reader.position();
        let cells = incoming
            .len()
            .checked_mul(outgoing.len())
            .filter(|&cells| cells <= reader.remaining() / 4)
            .ok_or_else(|| {
                Error::truncated(
                    at,
                    incoming.len().saturating_mul(outgoing.len()).saturating_mul(4),
                    reader.remaining(),
                )
            })?;
        let mut costs = Vec::with_capacity(cells);
        for _ in 0..cells {
            costs.push(reader.read_u32()?);
        }

        let count = read_count(reader, 4)?;
        let mut neighbours = Vec::with_capacity(count);
        for _ in 0..count {
            let len = reader.read_u32()? as usize;
            neighbours.push(reader.read_utf8(len)?);
        }

        debug!(
            "Cross-tile graph: {} incoming, {} outgoing, {} neighbours",
            incoming.len(),
            outgoing.len(),
            neighbours.len()
        );

        Ok(Self {
            incoming,
            outgoing,
            costs,
            neighbours,
        })
    }

    /// Cost of the route from incoming node `from` to outgoing node `to`
    pub fn cost(&self, from: usize, to: usize) -> Option<u32> {
        if from >= self.incoming.len() || to >= self.outgoing.len() {
            return None;
        }
        self.costs.get(from * self.outgoing.len() + to).copied()
    }

    /// Costs of all routes starting at incoming node `from`
    pub fn row(&self, from: usize) -> Option<&[u32]> {
        let width = self.outgoing.len();
        let start = from.checked_mul(width)?;
        self.costs.get(start..start.checked_add(width)?)
    }

    /// Name of the tile an outgoing node leads to
    pub fn neighbour_of(&self, node: &OutgoingNode) -> Option<&str> {
        self.neighbours
            .get(node.neighbour_index as usize)
            .map(String::as_str)
    }
}

/// Reads a `u32` element count and checks that the section can hold that
/// many elements of at least `min_size` bytes
fn read_count(reader: &mut SectionReader, min_size: usize) -> Result<usize> {
    let at = reader.position();
    let count = reader.read_u32()? as usize;
    let needed = count.saturating_mul(min_size);
    if needed > reader.remaining() {
        return Err(Error::truncated(at + 4, needed, reader.remaining()));
    }
    Ok(count)
}

fn read_point(reader: &mut SectionReader, space: &CoordSpace) -> Result<Point> {
    Ok(decode_delta(reader.read_u64()?, space.base_point()))
}
