// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Error type shared by the buffer, the resolvers and every serializer.
//!
//! Error constructors sit on the hot read/write paths as the cold branch of
//! every bounds check, so they are marked `#[cold]` and `#[track_caller]`.
//! Keep those attributes when adding new constructors.

use std::borrow::Cow;

use thiserror::Error;

/// Set `SKEIN_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("SKEIN_PANIC_ON_ERROR").is_some();

/// Whether errors panic at their creation site. Tests that assert on error
/// values return early when this is set.
#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for skein serialization, deserialization and copy operations.
///
/// Do not construct variants directly; use the constructor functions
/// ([`Error::buffer_underflow`], [`Error::unresolved_type`], ...). They accept
/// anything convertible into `Cow<'static, str>` and honour
/// `SKEIN_PANIC_ON_ERROR`:
///
/// ```bash
/// RUST_BACKTRACE=1 SKEIN_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// ```rust
/// use skein_core::error::Error;
///
/// let err = Error::unresolved_type(format!("unknown type id {}", 42));
/// let err = Error::null_not_allowed("map key");
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The refill source ran dry before `required` bytes were buffered.
    #[error("Buffer underflow: required {0} bytes, only {1} available")]
    BufferUnderflow(usize, usize),

    /// A polymorphic type id or a concrete type is missing from the registry.
    #[error("{0}")]
    UnresolvedType(Cow<'static, str>),

    /// A caller passed an argument no operation can accept.
    #[error("{0}")]
    InvalidArgument(Cow<'static, str>),

    /// A null key or value met a slot configured as non-nullable.
    #[error("{0}")]
    NullNotAllowed(Cow<'static, str>),

    /// The factory hook could not instantiate the requested container type.
    #[error("{0}")]
    ContainerConstruction(Cow<'static, str>),

    /// Corrupted input: unknown markers, malformed strings, header mismatch.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A back reference pointed at an id that was never registered.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    /// Object graph nested deeper than the configured maximum.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// Setup misuse or an object that does not match its serializer.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// The refill source failed.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

macro_rules! cow_constructor {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("SKEIN_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    /// Creates a new [`Error::BufferUnderflow`].
    ///
    /// ```
    /// use skein_core::error::Error;
    ///
    /// let err = Error::buffer_underflow(8, 3);
    /// assert_eq!(err.to_string(), "Buffer underflow: required 8 bytes, only 3 available");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_underflow(required: usize, available: usize) -> Self {
        let err = Error::BufferUnderflow(required, available);
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Io`] from a failed refill.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn io(err: std::io::Error) -> Self {
        let err = Error::Io(err);
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    cow_constructor!(
        /// Creates a new [`Error::UnresolvedType`].
        unresolved_type => UnresolvedType
    );

    cow_constructor!(
        /// Creates a new [`Error::InvalidArgument`].
        invalid_argument => InvalidArgument
    );

    cow_constructor!(
        /// Creates a new [`Error::NullNotAllowed`].
        null_not_allowed => NullNotAllowed
    );

    cow_constructor!(
        /// Creates a new [`Error::ContainerConstruction`].
        container_construction => ContainerConstruction
    );

    cow_constructor!(
        /// Creates a new [`Error::InvalidData`].
        invalid_data => InvalidData
    );

    cow_constructor!(
        /// Creates a new [`Error::InvalidRef`].
        invalid_ref => InvalidRef
    );

    cow_constructor!(
        /// Creates a new [`Error::DepthExceed`].
        depth_exceed => DepthExceed
    );

    cow_constructor!(
        /// Creates a new [`Error::TypeError`].
        type_error => TypeError
    );
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use skein_core::ensure;
/// use skein_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, "length must be positive");
///     ensure!(n < 10, Error::invalid_argument("length too large"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}
