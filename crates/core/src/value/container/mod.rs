// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

mod arena;
mod binary;
mod bool;
mod data_type;
mod number;
mod temporal;
mod utf8;

pub use arena::{Arena, ArenaRef};
pub use binary::BinaryContainer;
pub use bool::BoolContainer;
pub use data_type::DataTypeContainer;
pub use number::NumberContainer;
pub use temporal::TemporalContainer;
pub use utf8::Utf8Container;
