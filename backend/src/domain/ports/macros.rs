//! Helper macro for declaring port error enums.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type, so adapters
//! can write `OutboxStoreError::query("boom")` instead of spelling out the
//! struct variant.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use crate::domain::{OrganizationId, SiloMode};

    define_port_error! {
        pub enum ExamplePortError {
            Unavailable => "store unavailable",
            Query { message: String } => "query failed: {message}",
            Mapped { organization_id: OrganizationId } => "organization {organization_id} mapped",
            Misrouted { operation: String, current: SiloMode } => "{operation} misrouted to {current}",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(ExamplePortError::unavailable().to_string(), "store unavailable");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        assert_eq!(ExamplePortError::query("boom").to_string(), "query failed: boom");
    }

    #[test]
    fn constructors_accept_domain_types() {
        let err = ExamplePortError::mapped(OrganizationId::new(7));
        assert_eq!(err.to_string(), "organization 7 mapped");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ExamplePortError::misrouted("create", SiloMode::Region);
        assert_eq!(err.to_string(), "create misrouted to region");
    }
}
