// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared by the domain enums.

/// Implement `Display` by mapping each enum variant to a fixed string.
///
/// The strings should match the serde representation so that log lines,
/// CLI text output and JSON all agree on one spelling.
///
/// ```ignore
/// crate::simple_display! {
///     Track {
///         Recovery => "recovery",
///         Deployment => "deployment",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Implement `FromStr` for a fieldless enum using the same spellings as
/// its `Display` impl. Unknown input yields a `GuardError::Validation`
/// naming the accepted values.
#[macro_export]
macro_rules! parse_enum {
    ($enum:ty, $what:literal { $( $str:literal => $variant:ident ),+ $(,)? }) => {
        impl std::str::FromStr for $enum {
            type Err = $crate::error::GuardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $str => Ok(Self::$variant), )+
                    other => Err($crate::error::GuardError::Validation(format!(
                        "unknown {} '{}' (expected one of: {})",
                        $what,
                        other,
                        [$( $str ),+].join(", ")
                    ))),
                }
            }
        }
    };
}
