// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

/// Creates an [`Error`](crate::Error) from a diagnostic constructor call.
///
/// Usage: `error!(schema::unknown_attribute(name, &schema))`
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::error::Error($diagnostic)
	};
}

/// Returns an error built from a diagnostic constructor call.
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::error::Error($diagnostic))
	};
}

/// Creates an `Err(Error(..))` from a diagnostic constructor call.
#[macro_export]
macro_rules! err {
	($diagnostic:expr) => {
		Err($crate::error::Error($diagnostic))
	};
}

#[cfg(test)]
mod tests {
	use crate::error::diagnostic::memory::memory_exceeded;

	#[test]
	fn test_error_macro() {
		let err = error!(memory_exceeded(16, 0, 16, 0));
		assert_eq!(err.code(), "MEMORY_001");
		assert!(err.diagnostic().message.contains("quota"));
	}

	#[test]
	fn test_return_error_macro() {
		fn failing() -> crate::Result<()> {
			return_error!(memory_exceeded(16, 0, 16, 0));
		}

		let result = failing();
		assert!(result.is_err());
	}

	#[test]
	fn test_err_macro() {
		let result: crate::Result<()> = err!(memory_exceeded(16, 0, 16, 0));
		assert!(result.is_err());
	}
}
