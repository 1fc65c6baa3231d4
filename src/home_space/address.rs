//! Tree addresses and the routing decision.
//!
//! A node's 24 bit address reads `0xAC 8D 7W`: `D` is the depth nibble, `W` the width
//! nibble, the other bits name the network. Every node has up to five children, one level
//! below it at `depth - 1`, numbered by width so that child `p` (1..=5) of a node with
//! width `w` has width `(w - 1) * 5 + p`.
//!
//! ```text
//!                 #                  <- depth 2, width 1
//!     #     #     #     #     #      <- depth 1, width 1..=5
//!     ^- child on pipe 1    ^- child on pipe 5
//! ```
//!
//! Radio addresses follow from the tree address: pipe 0 receives traffic coming down from
//! the parent, pipes 1-5 receive traffic coming up from the five children. A node never
//! transmits to pipe 0 of the node above it.

use crate::config::{DataPipe, RadioAddress};

/// Mask of the bits that make up a tree address.
pub const TREE_ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Upper address byte of a node's downlink pipe (pipe 0).
pub const DOWNLINK_PREFIX: u32 = 0xDF00_0000;

/// Upper address byte of a node's uplink pipes (pipes 1-5).
pub const UPLINK_PREFIX: u32 = 0xEB00_0000;

/// Low address byte of uplink pipe 0; pipe `p` uses `UPLINK_LSB_BASE | p`.
pub const UPLINK_LSB_BASE: u8 = 0xC0;

/// Low address byte of the downlink pipe.
pub const DOWNLINK_LSB: u8 = 0x00;

/// Children per node.
pub const FAN_OUT: u8 = 5;

const DEPTH_SHIFT: u32 = 8;
const NIBBLE: u32 = 0xF;

/// Position of a node in the routing tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TreeAddress(u32);

impl TreeAddress {
    /// Creates an address from the low 24 bits of `raw`.
    pub const fn new(raw: u32) -> Self {
        Self(raw & TREE_ADDRESS_MASK)
    }

    /// The 24 bit address.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Level in the tree. Children sit one level lower than their parent.
    pub const fn depth(&self) -> u8 {
        ((self.0 >> DEPTH_SHIFT) & NIBBLE) as u8
    }

    /// Position within the level, starting at 1. Zero marks an address outside the tree.
    pub const fn width(&self) -> u8 {
        (self.0 & NIBBLE) as u8
    }

    /// Big-endian wire form.
    pub fn to_bytes(&self) -> [u8; 3] {
        let [_, b0, b1, b2] = self.0.to_be_bytes();
        [b0, b1, b2]
    }

    /// Parses the big-endian wire form.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    fn with_position(&self, depth: u8, width: u8) -> Self {
        let cleared = self.0 & !((NIBBLE << DEPTH_SHIFT) | NIBBLE);
        Self(cleared | (u32::from(depth) << DEPTH_SHIFT) | u32::from(width))
    }

    /// The node one level up that this node reports to.
    pub fn parent(&self) -> Option<TreeAddress> {
        let width = self.width().checked_sub(1)? / FAN_OUT + 1;
        let depth = self.depth().checked_add(1).filter(|d| u32::from(*d) <= NIBBLE)?;
        Some(self.with_position(depth, width))
    }

    /// The child reached through `pipe` (1-5).
    pub fn child(&self, pipe: DataPipe) -> Option<TreeAddress> {
        if pipe == DataPipe::DP0 {
            return None;
        }
        let depth = self.depth().checked_sub(1)?;
        let width = self
            .width()
            .checked_sub(1)?
            .checked_mul(FAN_OUT)?
            .checked_add(pipe.number())
            .filter(|w| u32::from(*w) <= NIBBLE)?;
        Some(self.with_position(depth, width))
    }

    /// The pipe of the parent this node transmits to.
    pub fn uplink_pipe(&self) -> Option<DataPipe> {
        let pipe = self.width().checked_sub(1)? % FAN_OUT + 1;
        DataPipe::try_from(pipe).ok()
    }

    /// Address of this node's pipe 0, written to by its parent.
    pub fn downlink_address(&self) -> RadioAddress {
        RadioAddress::new(DOWNLINK_PREFIX | self.0, DOWNLINK_LSB)
    }

    /// Address of this node's uplink `pipe`, written to by the child on that pipe.
    pub fn uplink_address(&self, pipe: DataPipe) -> RadioAddress {
        RadioAddress::new(UPLINK_PREFIX | self.0, UPLINK_LSB_BASE | pipe.number())
    }
}

/// Where a packet goes next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Route {
    /// Addressed to this node.
    Local,
    /// Towards the root, through the parent.
    Up,
    /// Towards the leaves, through the child on this pipe.
    Down(DataPipe),
}

/// Decides where a packet for `destination` goes from the node at `board`.
///
/// - `destination == board`: [`Route::Local`]
/// - same depth: [`Route::Up`]
/// - one level below, inside this node's subtree: down the pipe `((width - 1) % 5) + 1`
/// - two levels below, inside this node's subtree: down the pipe
///   `(((width - 1) / 5) % 5) + 1`
/// - anything else, including a width outside this node's subtree or a width of 0:
///   [`Route::Up`]
pub fn route(destination: TreeAddress, board: TreeAddress) -> Route {
    if destination == board {
        return Route::Local;
    }
    let depth = destination.depth();
    if depth == board.depth() {
        return Route::Up;
    }
    let (Some(offset), Some(own)) = (
        destination.width().checked_sub(1),
        board.width().checked_sub(1),
    ) else {
        return Route::Up;
    };

    let pipe = if Some(depth) == board.depth().checked_sub(1) && offset / FAN_OUT == own {
        offset % FAN_OUT + 1
    } else if Some(depth) == board.depth().checked_sub(2)
        && offset / (FAN_OUT * FAN_OUT) == own
    {
        (offset / FAN_OUT) % FAN_OUT + 1
    } else {
        return Route::Up;
    };
    DataPipe::try_from(pipe).map_or(Route::Up, Route::Down)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: TreeAddress = TreeAddress::new(0xAC8271);

    #[test]
    fn test_depth_and_width() {
        let address = TreeAddress::new(0xAC8171);
        assert_eq!(address.depth(), 1);
        assert_eq!(address.width(), 1);
        assert_eq!(TreeAddress::new(0xFFAC_827B).raw(), 0xAC827B);
        assert_eq!(TreeAddress::new(0xAC827B).width(), 11);
        assert_eq!(address.to_bytes(), [0xAC, 0x81, 0x71]);
        assert_eq!(TreeAddress::from_bytes([0xAC, 0x81, 0x71]), address);
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route(BOARD, BOARD), Route::Local);
        assert_eq!(route(TreeAddress::new(0xAC8273), BOARD), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8177), BOARD), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8171), BOARD), Route::Down(DataPipe::DP1));
        assert_eq!(route(TreeAddress::new(0xAC8175), BOARD), Route::Down(DataPipe::DP5));
        assert_eq!(route(TreeAddress::new(0xAC8073), BOARD), Route::Down(DataPipe::DP1));
        assert_eq!(route(TreeAddress::new(0xAC8076), BOARD), Route::Down(DataPipe::DP2));
        assert_eq!(route(TreeAddress::new(0xAC807B), BOARD), Route::Down(DataPipe::DP3));
        assert_eq!(route(TreeAddress::new(0xAC8371), BOARD), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8471), BOARD), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8170), BOARD), Route::Up);
    }

    #[test]
    fn test_route_from_the_bottom_level() {
        let leaf = TreeAddress::new(0xAC8072);
        assert_eq!(route(TreeAddress::new(0xAC8171), leaf), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8073), leaf), Route::Up);
    }

    /// Every node of a three level tree rooted at depth 3. Widths above 15 do not fit the
    /// width nibble, so only the first three depth 2 nodes have children.
    fn three_level_tree() -> impl Iterator<Item = TreeAddress> {
        let root = core::iter::once(TreeAddress::new(0xAC8371));
        let middle = (1..=5).map(|width| TreeAddress::new(0xAC8270 | width));
        let leaves = (1..=15).map(|width| TreeAddress::new(0xAC8170 | width));
        root.chain(middle).chain(leaves)
    }

    #[test]
    fn test_every_destination_is_reached() {
        const ROOT: TreeAddress = TreeAddress::new(0xAC8371);
        // leaf, parent, root, parent, leaf
        const LONGEST_PATH: usize = 4;

        for start in three_level_tree() {
            for destination in three_level_tree() {
                let mut node = start;
                let mut hops = 0;
                loop {
                    match route(destination, node) {
                        Route::Local => break,
                        Route::Up => {
                            assert_ne!(node, ROOT, "{start:?} -> {destination:?} left the tree");
                            node = node.parent().unwrap();
                        }
                        Route::Down(pipe) => node = node.child(pipe).unwrap(),
                    }
                    hops += 1;
                    assert!(
                        hops <= LONGEST_PATH,
                        "{start:?} -> {destination:?} still travelling at {node:?}"
                    );
                }
                assert_eq!(node, destination);
            }
        }
    }

    #[test]
    fn test_route_from_a_board_past_width_one() {
        let board = TreeAddress::new(0xAC8272);
        assert_eq!(route(TreeAddress::new(0xAC8171), board), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8176), board), Route::Down(DataPipe::DP1));
        assert_eq!(route(TreeAddress::new(0xAC817A), board), Route::Down(DataPipe::DP5));
        assert_eq!(route(TreeAddress::new(0xAC817B), board), Route::Up);
        assert_eq!(route(TreeAddress::new(0xAC8071), board), Route::Up);
    }

    #[test]
    fn test_parent_and_children_agree() {
        let parent = TreeAddress::new(0xAC8272);
        for pipe in [DataPipe::DP1, DataPipe::DP3, DataPipe::DP5] {
            let child = parent.child(pipe).unwrap();
            assert_eq!(child.depth(), 1);
            assert_eq!(child.parent(), Some(parent));
            assert_eq!(child.uplink_pipe(), Some(pipe));
            assert_eq!(route(child, parent), Route::Down(pipe));
        }
        assert_eq!(parent.child(DataPipe::DP0), None);
        assert_eq!(TreeAddress::new(0xAC8071).child(DataPipe::DP1), None);
        assert_eq!(TreeAddress::new(0xAC8274).child(DataPipe::DP1), None);
        assert_eq!(TreeAddress::new(0xAC8170).parent(), None);
    }

    #[test]
    fn test_radio_addresses() {
        let node = TreeAddress::new(0xAC8171);
        assert_eq!(node.downlink_address().as_u64(), 0xDFAC_8171_00);
        assert_eq!(node.uplink_address(DataPipe::DP3).as_u64(), 0xEBAC_8171_C3);
        assert_eq!(
            node.uplink_address(DataPipe::DP1).high(),
            node.uplink_address(DataPipe::DP5).high()
        );
    }
}
