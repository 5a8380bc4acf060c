//! # Ordering
//!
//! The list splice behind drag-and-drop reordering, plus dense renumbering.
//!
//! ```text
//!   before:  [A:0] [B:1] [C:2] [D:3] [E:4]
//!   move 0 → 4
//!   after:   [B:0] [C:1] [D:2] [E:3] [A:4]
//!            └──── every shifted item changes position ────┘
//! ```
//!
//! Both steps are synchronous and allocation-free on the list itself. Only
//! the returned `PositionUpdate`s allocate.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One entry of a bulk position update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PositionUpdate {
    pub id: String,
    pub new_position: i64,
}

/// Moves the element at `from` so it ends up at index `to`, shifting the
/// elements in between by one.
///
/// Returns `false` (and leaves the slice untouched) if either index is out
/// of bounds.
///
/// ```rust
/// use menu_core::ordering::move_item;
///
/// let mut list = ['a', 'b', 'c', 'd', 'e'];
/// assert!(move_item(&mut list, 0, 4));
/// assert_eq!(list, ['b', 'c', 'd', 'e', 'a']);
///
/// assert!(move_item(&mut list, 3, 1));
/// assert_eq!(list, ['b', 'e', 'c', 'd', 'a']);
/// ```
pub fn move_item<T>(list: &mut [T], from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() {
        return false;
    }
    if from < to {
        list[from..=to].rotate_left(1);
    } else if from > to {
        list[to..=from].rotate_right(1);
    }
    true
}

/// Assigns every element its index (offset by `base`) as position and
/// returns an update for each element whose position changed.
///
/// `get` reads the element's id and current position; `set` writes the new
/// position.
pub fn renumber<T>(
    list: &mut [T],
    base: i64,
    get: impl Fn(&T) -> (&str, i64),
    mut set: impl FnMut(&mut T, i64),
) -> Vec<PositionUpdate> {
    let mut updates = Vec::new();
    for (index, item) in list.iter_mut().enumerate() {
        let new_position = base + index as i64;
        let (id, old_position) = get(item);
        if old_position != new_position {
            updates.push(PositionUpdate {
                id: id.to_string(),
                new_position,
            });
            set(item, new_position);
        }
    }
    updates
}

/// True if the positions are exactly `base, base + 1, …, base + n − 1` in
/// order.
pub fn is_contiguous(positions: impl IntoIterator<Item = i64>, base: i64) -> bool {
    positions
        .into_iter()
        .enumerate()
        .all(|(index, position)| position == base + index as i64)
}
