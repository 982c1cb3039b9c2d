// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

pub mod columnar;
pub mod error;
pub mod memory;
pub mod num;
pub mod sort;
pub mod util;
pub mod value;

pub use columnar::{Attribute, Block, ColumnData, Nullability, Schema, View};
pub use error::{Error, Result, diagnostic::Diagnostic};
pub use sort::{Permutation, SortDirection, SortKey, SortSpecification};
pub use util::{BitVec, CowVec};
pub use value::{DataType, Date, DateTime, Value};
