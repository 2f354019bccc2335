//! Logging shim for the display crate.
//!
//! Enable with `--features defmt`. All log macros become no-ops when the
//! feature is disabled; the no-op forms still borrow their arguments.

#[cfg(feature = "defmt")]
pub(crate) use defmt::trace;

#[cfg(not(feature = "defmt"))]
macro_rules! trace_noop {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(not(feature = "defmt"))]
pub(crate) use trace_noop as trace;
