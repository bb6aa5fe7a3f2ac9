//! `define_port_error!` generates port error enums with `thiserror` messages
//! and one snake_case constructor per variant whose fields accept `impl Into`.

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
    //! Regression coverage for this module.
    define_port_error! {
        pub enum StoreError {
            Unreachable { host: String } => "store unreachable: {host}",
            Busy { attempts: u32 } => "store busy after {attempts} attempts",
            Rejected { table: String, code: u32 } => "{table} rejected write ({code})",
            Closed => "store closed",
        }
    }

    #[test]
    fn string_fields_accept_borrowed_input() {
        let err = StoreError::unreachable("db.internal");
        assert_eq!(err.to_string(), "store unreachable: db.internal");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        assert_eq!(StoreError::busy(3_u32).to_string(), "store busy after 3 attempts");
    }

    #[test]
    fn mixed_fields_and_unit_variants_get_constructors() {
        let err = StoreError::rejected("contacts", 23505_u32);
        assert_eq!(err.to_string(), "contacts rejected write (23505)");
        assert_eq!(StoreError::closed(), StoreError::Closed);
    }
}
