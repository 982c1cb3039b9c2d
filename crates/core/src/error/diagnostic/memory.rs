// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use super::Diagnostic;

pub fn memory_exceeded(quota: u64, available: u64, usage: u64, parent_available: u64) -> Diagnostic {
	Diagnostic::new(
		"MEMORY_001",
		format!(
			"couldn't copy any data into an empty buffer; hard quota ran out \
			 (quota={quota}, available={available}, usage={usage}, \
			 parent available={parent_available})"
		),
	)
	.with_note(
		"parent availability can be smaller than the buffer's own because a \
		 soft-quota bypass was already drawn down"
			.to_string(),
	)
}
