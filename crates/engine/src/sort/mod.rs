// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

mod cursor;
mod extended;
mod order;
mod progressive;
mod sorter;

pub use cursor::{SortCursor, bound_sort};
pub use extended::bound_extended_sort;
pub use order::BoundSortOrder;
pub use progressive::sort_permutation;
pub use sorter::{BufferingSorter, Sorter, UnbufferedSorter};
